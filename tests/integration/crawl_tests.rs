//! End-to-end crawl tests
//!
//! These tests run the full coordinator with the plain HTTP browser against
//! a mock site.

use crate::{create_test_config, page};
use deepsweep::crawler::Coordinator;
use deepsweep::store::{JsonDirStore, MemoryStore};
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_not_found(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .mount(server)
        .await;
}

/// Shop with a sitemap of 10 URLs and two category pages listing 5
/// subcategories and 20 products between them
async fn mount_shop(server: &MockServer) {
    let base = server.uri();

    mount_page(
        server,
        "/robots.txt",
        format!("User-agent: *\nAllow: /\nSitemap: {base}/sitemap.xml\n"),
    )
    .await;

    let sitemap_paths = [
        "/collections/men",
        "/collections/women",
        "/about",
        "/faq",
        "/contact",
        "/blog",
        "/blog/first-post",
        "/blog/second-post",
        "/shipping",
        "/returns",
    ];
    let locs: String = sitemap_paths
        .iter()
        .map(|p| format!("<url><loc>{base}{p}</loc></url>"))
        .collect();
    mount_page(
        server,
        "/sitemap.xml",
        format!(r#"<?xml version="1.0"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{locs}</urlset>"#),
    )
    .await;

    let home = format!(
        "<html><head><title>Shop</title></head><body>\
         <nav><a href=\"/collections/men\">Men</a><a href=\"/collections/women\">Women</a></nav>\
         <main><h1>Welcome</h1><p>{}</p></main>\
         <footer><a href=\"/about\">About</a><a href=\"/cart\">Cart</a></footer></body></html>",
        "Welcome to the shop, browse the collections below. ".repeat(8)
    );
    mount_page(server, "/", home).await;

    let mut men: Vec<String> = ["shoes", "shirts", "hats"]
        .iter()
        .map(|s| format!("/collections/men-{s}"))
        .collect();
    men.extend((0..10).map(|i| format!("/products/men-item-{i}")));
    mount_page(server, "/collections/men", page("Men", &men)).await;

    let mut women: Vec<String> = ["shoes", "bags"]
        .iter()
        .map(|s| format!("/collections/women-{s}"))
        .collect();
    women.extend((0..10).map(|i| format!("/products/women-item-{i}")));
    mount_page(server, "/collections/women", page("Women", &women)).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/collections/[a-z-]+$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Subcategory", &[])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/products/[a-z0-9-]+$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Product", &[])))
        .mount(server)
        .await;
    for p in sitemap_paths.iter().skip(2) {
        mount_page(server, p, page(p, &[])).await;
    }

    mount_not_found(server).await;
}

#[tokio::test]
async fn test_shop_crawl_within_budget() {
    let server = MockServer::start().await;
    mount_shop(&server).await;

    let store = Arc::new(MemoryStore::new());
    let report = Coordinator::new(&server.uri(), create_test_config(50), store.clone())
        .unwrap()
        .run()
        .await;

    assert!(report.total_pages <= 50, "visited {}", report.total_pages);
    assert!(report.by_category.product >= 20);
    assert!(report.by_category.category >= 7);

    let unique: HashSet<_> = report.discovered_urls.iter().collect();
    assert_eq!(unique.len(), report.discovered_urls.len());
    assert_eq!(report.total_discovered, report.discovered_urls.len());
    assert_eq!(report.by_category.total(), report.total_discovered);

    assert!(report
        .discovered_urls
        .iter()
        .any(|u| u.ends_with("/collections/men?page=2")));
    assert!(report.discovered_urls.iter().any(|u| u.ends_with("/shipping")));
    assert!(!report.discovered_urls.iter().any(|u| u.ends_with("/cart")));

    assert!(report.stats.documents_stored > 0);
    assert_eq!(store.len(), report.stats.documents_stored);
}

#[tokio::test]
async fn test_captcha_page_is_reloaded_once_then_counted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><h1>Unusual activity</h1><div class=\"g-recaptcha\">captcha</div></body></html>",
        ))
        .expect(2)
        .mount(&server)
        .await;
    mount_not_found(&server).await;

    let store = Arc::new(MemoryStore::new());
    let report = Coordinator::new(&server.uri(), create_test_config(50), store.clone())
        .unwrap()
        .run()
        .await;

    assert_eq!(report.stats.errors_encountered, 1);
    assert_eq!(report.stats.blocked_pages, 1);
    assert_eq!(report.discovered_urls, vec![format!("{}/", server.uri())]);
    assert_eq!(report.by_category.content, 1);
    assert_eq!(report.stats.chunks_emitted, 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_robots_disallow_is_honored() {
    let server = MockServer::start().await;
    mount_page(&server, "/robots.txt", "User-agent: *\nDisallow: /private\n".to_string()).await;
    mount_page(
        &server,
        "/",
        page("Home", &["/private/report".to_string(), "/public".to_string()]),
    )
    .await;
    mount_page(&server, "/public", page("Public", &[])).await;
    Mock::given(method("GET"))
        .and(path("/private/report"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Secret", &[])))
        .expect(0)
        .mount(&server)
        .await;
    mount_not_found(&server).await;

    let report = Coordinator::new(
        &server.uri(),
        create_test_config(10),
        Arc::new(MemoryStore::new()),
    )
    .unwrap()
    .run()
    .await;

    assert_eq!(report.total_pages, 2);
    assert!(report.stats.filtered_out >= 1);
    assert!(!report.discovered_urls.iter().any(|u| u.contains("/private")));
}

#[tokio::test]
async fn test_server_errors_do_not_abort_the_crawl() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        page("Home", &["/broken".to_string(), "/fine".to_string()]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;
    mount_page(&server, "/fine", page("Fine", &[])).await;
    mount_not_found(&server).await;

    let mut config = create_test_config(10);
    config.fetch.max_attempts = 2;

    let report = Coordinator::new(&server.uri(), config, Arc::new(MemoryStore::new()))
        .unwrap()
        .run()
        .await;

    assert_eq!(report.total_pages, 3);
    assert_eq!(report.stats.pages_fetched, 2);
    assert_eq!(report.stats.errors_encountered, 1);
    assert_eq!(report.stats.documents_stored, 2);
}

#[tokio::test]
async fn test_documents_written_to_json_dir() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/about".to_string()])).await;
    mount_page(&server, "/about", page("About", &[])).await;
    mount_not_found(&server).await;

    let dir = TempDir::new().unwrap();
    let store = JsonDirStore::new(dir.path().join("content"));
    let report = Coordinator::new(&server.uri(), create_test_config(10), Arc::new(store))
        .unwrap()
        .run()
        .await;

    let files = std::fs::read_dir(dir.path().join("content"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "json"))
        .count();
    assert_eq!(report.stats.documents_stored, 2);
    assert_eq!(files, 2);
}
