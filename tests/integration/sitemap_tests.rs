//! Sitemap and robots.txt resolution against a mock site

use crate::{create_test_config, page};
use deepsweep::crawler::Coordinator;
use deepsweep::robots::fetch_robots;
use deepsweep::sitemap::SitemapResolver;
use deepsweep::store::MemoryStore;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_robots_directive_and_index_expansion() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!("User-agent: *\nSitemap: {base}/maps/index.xml\n")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/maps/index.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<sitemapindex><sitemap><loc>{base}/maps/products.xml</loc></sitemap>\
             <sitemap><loc>{base}/maps/broken.xml</loc></sitemap></sitemapindex>"
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/maps/products.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<urlset><url><loc>{base}/products/a</loc></url><url><loc>{base}/products/b</loc></url></urlset>"
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/maps/broken.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<urlset><url><loc>x</url>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let origin = Url::parse(&base).unwrap();
    let robots = fetch_robots(&client, &origin, Duration::from_secs(2)).await;
    assert_eq!(robots.sitemaps().len(), 1);

    let resolver = SitemapResolver::new(client, &create_test_config(10).sitemap);
    let outcome = resolver.resolve(&origin, &robots).await;

    assert_eq!(
        outcome.urls,
        vec![format!("{base}/products/a"), format!("{base}/products/b")]
    );
    assert_eq!(outcome.errors, 1);
}

#[tokio::test]
async fn test_sitemap_only_pages_are_crawled() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<urlset><url><loc>{base}/hidden-page</loc></url></urlset>"
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Home", &[])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hidden-page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Hidden", &[])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let report = Coordinator::new(&base, create_test_config(10), Arc::new(MemoryStore::new()))
        .unwrap()
        .run()
        .await;

    assert_eq!(
        report.discovered_urls,
        vec![format!("{base}/"), format!("{base}/hidden-page")]
    );
    assert_eq!(report.total_pages, 2);
    assert_eq!(report.stats.errors_encountered, 0);
}
