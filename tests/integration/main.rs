//! Integration tests for Deepsweep
//!
//! Every test drives a wiremock server standing in for a real site.

mod chrome_tests;
mod crawl_tests;
mod sitemap_tests;

use deepsweep::config::Config;

/// Configuration with every delay removed and a single fetch attempt
pub fn create_test_config(max_pages: usize) -> Config {
    let mut config = Config::default();
    config.crawler.max_pages = max_pages;
    config.crawler.delay_ms = 0;
    config.crawler.concurrency = 3;
    config.fetch.max_attempts = 1;
    config.fetch.navigation_timeout_ms = 5_000;
    config.fetch.backoff_base_ms = 0;
    config.fetch.block_reload_min_ms = 0;
    config.fetch.block_reload_max_ms = 0;
    config.fetch.human_simulation = false;
    config.fetch.human_pause_min_ms = 0;
    config.fetch.human_pause_max_ms = 0;
    config.sitemap.timeout_ms = 2_000;
    config.pagination.max_pages = 5;
    config
}

/// A page whose main content is long enough to be chunked
pub fn page(title: &str, links: &[String]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<li><a href="{href}">{href}</a></li>"#))
        .collect();
    let prose = format!("{title} is described here at some length for readers. ").repeat(8);
    format!(
        "<html><head><title>{title}</title></head><body>\
         <main><h1>{title}</h1><p>{prose}</p><ul class=\"grid\">{anchors}</ul></main>\
         </body></html>"
    )
}
