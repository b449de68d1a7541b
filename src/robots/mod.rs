//! Robots.txt handling
//!
//! A crawl fetches robots.txt once, for the seed's origin. A missing or
//! unreachable file means everything is allowed.

mod parser;

pub use parser::ParsedRobots;

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Fetches and parses `/robots.txt` for the origin of `origin`
///
/// # Arguments
///
/// * `client` - HTTP client used for the request
/// * `origin` - Any URL on the site; only scheme, host and port are used
/// * `timeout` - Request timeout
///
/// # Returns
///
/// The parsed file, or [`ParsedRobots::allow_all`] on any failure
pub async fn fetch_robots(client: &Client, origin: &Url, timeout: Duration) -> ParsedRobots {
    let robots_url = match origin.join("/robots.txt") {
        Ok(url) => url,
        Err(e) => {
            warn!("Cannot build robots.txt URL for {}: {}", origin, e);
            return ParsedRobots::allow_all();
        }
    };

    debug!("Fetching {}", robots_url);

    let response = match client.get(robots_url.clone()).timeout(timeout).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!("Failed to fetch {}: {}", robots_url, e);
            return ParsedRobots::allow_all();
        }
    };

    if !response.status().is_success() {
        debug!(
            "{} returned {}, allowing all",
            robots_url,
            response.status().as_u16()
        );
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => {
            let robots = ParsedRobots::from_content(&body);
            info!(
                "Loaded robots.txt ({} bytes, {} sitemap directives)",
                body.len(),
                robots.sitemaps().len()
            );
            robots
        }
        Err(e) => {
            warn!("Failed to read {}: {}", robots_url, e);
            ParsedRobots::allow_all()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_robots_parses_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "User-agent: *\nDisallow: /cart\nCrawl-delay: 2\nSitemap: https://shop.test/s.xml",
            ))
            .mount(&server)
            .await;

        let origin = Url::parse(&format!("{}/some/page", server.uri())).unwrap();
        let robots = fetch_robots(&Client::new(), &origin, Duration::from_secs(5)).await;

        assert!(!robots.is_allowed(&format!("{}/cart", server.uri()), "deepsweep"));
        assert_eq!(robots.crawl_delay("deepsweep"), Some(2.0));
        assert_eq!(robots.sitemaps().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_robots_allows_all() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let origin = Url::parse(&server.uri()).unwrap();
        let robots = fetch_robots(&Client::new(), &origin, Duration::from_secs(5)).await;
        assert!(robots.is_allowed(&format!("{}/cart", server.uri()), "deepsweep"));
    }

    #[tokio::test]
    async fn test_unreachable_robots_allows_all() {
        let origin = Url::parse("http://127.0.0.1:9/").unwrap();
        let robots = fetch_robots(&Client::new(), &origin, Duration::from_millis(500)).await;
        assert!(robots.is_allowed("http://127.0.0.1:9/anything", "deepsweep"));
    }
}
