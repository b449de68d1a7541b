//! Sitemap discovery and expansion
//!
//! Candidates come from robots.txt `Sitemap:` directives, then from a fixed
//! list of conventional paths. Index documents are expanded breadth-first up
//! to a nesting bound. A bad candidate is logged and skipped.

mod parser;

pub use parser::{parse_sitemap, SitemapDocument};

use crate::config::SitemapConfig;
use crate::robots::ParsedRobots;
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// Conventional sitemap locations, tried in order after robots.txt directives
pub const CONVENTIONAL_PATHS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap-index.xml",
    "/sitemaps.xml",
    "/sitemap/sitemap.xml",
    "/wp-sitemap.xml",
    "/product-sitemap.xml",
    "/category-sitemap.xml",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SitemapError {
    #[error("Malformed sitemap {url}: {message}")]
    Xml { url: String, message: String },

    #[error("{url} is not a sitemap (root element '{root}')")]
    NotASitemap { url: String, root: String },

    #[error("Failed to fetch sitemap {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Sitemap {url} returned HTTP {status}")]
    Http { url: String, status: u16 },
}

/// Result of resolving every sitemap candidate of a site
#[derive(Debug, Clone, Default)]
pub struct SitemapOutcome {
    /// Leaf page URLs in document order, not de-duplicated
    pub urls: Vec<String>,
    /// Documents fetched and parsed successfully
    pub documents: usize,
    /// Candidates that failed for reasons other than not existing
    pub errors: usize,
}

/// Resolves a site's sitemaps into page URLs
pub struct SitemapResolver {
    client: Client,
    timeout: Duration,
    max_nesting: u32,
    max_urls: usize,
    extra_paths: Vec<String>,
}

impl SitemapResolver {
    pub fn new(client: Client, config: &SitemapConfig) -> Self {
        Self {
            client,
            timeout: Duration::from_millis(config.timeout_ms),
            max_nesting: config.max_nesting,
            max_urls: config.max_urls,
            extra_paths: config.extra_paths.clone(),
        }
    }

    /// Ordered, de-duplicated list of top-level sitemap candidates
    pub fn candidates(&self, origin: &Url, robots: &ParsedRobots) -> Vec<Url> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        let directives = robots.sitemaps().iter().map(String::as_str);
        let conventional = CONVENTIONAL_PATHS
            .iter()
            .copied()
            .chain(self.extra_paths.iter().map(String::as_str));

        for raw in directives.chain(conventional) {
            let Ok(mut url) = Url::parse(raw).or_else(|_| origin.join(raw)) else {
                debug!("Skipping unusable sitemap location '{}'", raw);
                continue;
            };
            url.set_fragment(None);
            if seen.insert(url.to_string()) {
                candidates.push(url);
            }
        }

        candidates
    }

    /// Fetches every candidate and expands indexes
    ///
    /// # Arguments
    ///
    /// * `origin` - Seed URL; conventional paths are joined onto its origin
    /// * `robots` - Parsed robots.txt supplying `Sitemap:` directives
    ///
    /// # Returns
    ///
    /// Leaf URLs plus counters. Never fails: per-candidate errors are logged
    /// and counted.
    pub async fn resolve(&self, origin: &Url, robots: &ParsedRobots) -> SitemapOutcome {
        let mut outcome = SitemapOutcome::default();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(Url, u32)> = self
            .candidates(origin, robots)
            .into_iter()
            .map(|url| (url, 0))
            .collect();

        while let Some((url, nesting)) = queue.pop_front() {
            if outcome.urls.len() >= self.max_urls {
                info!("Sitemap URL cap ({}) reached", self.max_urls);
                break;
            }
            if !visited.insert(url.to_string()) {
                continue;
            }

            let document = match self.fetch_document(&url).await {
                Ok(Some(document)) => document,
                Ok(None) => continue,
                Err(e) => {
                    warn!("{}", e);
                    outcome.errors += 1;
                    continue;
                }
            };
            outcome.documents += 1;

            match document {
                SitemapDocument::Index(children) => {
                    debug!("Sitemap index {} lists {} sitemaps", url, children.len());
                    if nesting >= self.max_nesting {
                        warn!(
                            "Sitemap index {} exceeds nesting depth {}, not expanding",
                            url, self.max_nesting
                        );
                        continue;
                    }
                    for child in children {
                        match Url::parse(&child) {
                            Ok(child) if !visited.contains(child.as_str()) => {
                                queue.push_back((child, nesting + 1))
                            }
                            Ok(_) => {}
                            Err(e) => debug!("Skipping sitemap location '{}': {}", child, e),
                        }
                    }
                }
                SitemapDocument::UrlSet(locs) => {
                    debug!("Sitemap {} lists {} URLs", url, locs.len());
                    let room = self.max_urls - outcome.urls.len();
                    outcome.urls.extend(locs.into_iter().take(room));
                }
            }
        }

        info!(
            "Sitemaps: {} documents, {} URLs, {} errors",
            outcome.documents,
            outcome.urls.len(),
            outcome.errors
        );
        outcome
    }

    /// Fetches and parses one sitemap; `Ok(None)` when it does not exist
    async fn fetch_document(&self, url: &Url) -> Result<Option<SitemapDocument>, SitemapError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SitemapError::Fetch {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status == 404 || status == 410 {
            debug!("No sitemap at {}", url);
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(SitemapError::Http {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await.map_err(|e| SitemapError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        parse_sitemap(url, &body).map(Some)
    }
}
