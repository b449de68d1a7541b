//! Deepsweep: discovery-and-crawl engine for unknown websites
//!
//! This crate discovers, fetches and normalizes the content of a single website
//! under a page budget. It resolves sitemaps and robots.txt, categorizes URLs,
//! synthesizes pagination candidates, fetches pages through an anti-detection
//! layer and emits content-addressed text chunks for a downstream indexer.

pub mod config;
pub mod content;
pub mod crawler;
pub mod discovery;
pub mod fetch;
pub mod frontier;
pub mod output;
pub mod robots;
pub mod sitemap;
pub mod store;
pub mod url;

use thiserror::Error;

/// Errors that stop a crawl before it starts
///
/// Once a run is under way, failures are logged and counted in the report's
/// statistics instead.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid seed URL '{url}': {reason}")]
    Validation { url: String, reason: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    Fetch(#[from] fetch::FetchError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

// Re-export commonly used types
pub use config::Config;
pub use content::{ContentChunk, ContentDocument};
pub use crawler::{Coordinator, ProgressEvent};
pub use discovery::UrlCategory;
pub use fetch::{FetchStatus, PageFetchResult};
pub use frontier::{CrawlTarget, Frontier};
pub use output::{CrawlStats, DiscoveryReport};
pub use store::ContentStore;
pub use url::normalize_url;
