use crate::discovery::UrlCategory;
use serde::Serialize;
use std::fmt;
use url::Url;

/// The crawl phase that discovered a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrawlPhase {
    Seed,
    Sitemap,
    StrategicLinks,
    CategoryTraversal,
    Pagination,
    DynamicDiscovery,
    Exhaustive,
}

impl CrawlPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seed => "seed",
            Self::Sitemap => "sitemap",
            Self::StrategicLinks => "strategic-links",
            Self::CategoryTraversal => "category-traversal",
            Self::Pagination => "pagination",
            Self::DynamicDiscovery => "dynamic-discovery",
            Self::Exhaustive => "exhaustive",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discovered URL with its bucket and provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// Normalized URL, unique across the frontier
    pub url: Url,
    pub category: UrlCategory,
    /// Link distance from the seed; sitemap URLs sit at depth 1
    pub depth: u32,
    pub phase: CrawlPhase,
}
