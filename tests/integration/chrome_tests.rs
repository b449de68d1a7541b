//! Headless Chrome sessions against a mock site
//!
//! These need a local Chrome or Chromium; run with `cargo test -- --ignored`.

use deepsweep::fetch::{Browser, ChromeBrowser, Fingerprint};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SCRIPTED_LISTING: &str = r#"<html><head><title>Shoes</title></head><body>
<main><ul id="grid"></ul><button id="more" onclick="loadMore()">Load more</button></main>
<script>
  const grid = document.getElementById('grid');
  grid.innerHTML = '<li><a href="/products/js-only">JS only</a></li>';
  function loadMore() {
    fetch('/api/products?page=2');
    grid.insertAdjacentHTML('beforeend', '<li><a href="/products/after-click">After click</a></li>');
  }
</script>
</body></html>"#;

#[tokio::test]
#[ignore = "needs a local Chrome or Chromium"]
async fn test_chrome_renders_and_interacts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/collections/shoes"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(SCRIPTED_LISTING),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;

    let browser = ChromeBrowser::launch(None, true).await.unwrap();
    let mut session = browser.open_session(&Fingerprint::random()).await.unwrap();
    let url = Url::parse(&format!("{}/collections/shoes", server.uri())).unwrap();

    let nav = session.navigate(&url).await.unwrap();
    assert_eq!(nav.status, 200);

    session.scroll_by(600).await.unwrap();
    session.move_mouse(200, 300).await.unwrap();
    assert!(session.click_load_more().await.unwrap());
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;

    let html = session.content().await.unwrap();
    assert!(html.contains("/products/js-only"));
    assert!(html.contains("/products/after-click"));

    let subresources = session.observed_subresources();
    assert!(subresources
        .iter()
        .any(|u| u.path() == "/api/products" && u.query() == Some("page=2")));

    session.close().await;
    assert!(session.content().await.is_err());
}

#[tokio::test]
#[ignore = "needs a local Chrome or Chromium"]
async fn test_chrome_sessions_do_not_share_cookies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><script>document.body.dataset.seen = document.cookie; \
             document.cookie = 'visited=1';</script></body></html>",
        ))
        .mount(&server)
        .await;

    let browser = ChromeBrowser::launch(None, true).await.unwrap();
    let url = Url::parse(&format!("{}/", server.uri())).unwrap();

    for _ in 0..2 {
        let mut session = browser.open_session(&Fingerprint::random()).await.unwrap();
        session.navigate(&url).await.unwrap();
        let html = session.content().await.unwrap();
        assert!(!html.contains("data-seen=\"visited=1\""));
        session.close().await;
    }
}
