//! Output module for crawl reports
//!
//! This module handles:
//! - The JSON discovery report returned by every run
//! - Markdown summaries of a run
//! - Crawl statistics and their console rendering

mod markdown;
mod report;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use report::{CategoryCounts, DiscoveryReport};
pub use stats::{print_statistics, CrawlStats};

use thiserror::Error;

/// Errors that can occur while writing reports
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
