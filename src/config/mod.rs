//! Configuration module for Deepsweep
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every table and key has a default, so an empty file is a valid configuration.
//!
//! # Example
//!
//! ```no_run
//! use deepsweep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("deepsweep.toml")).unwrap();
//! println!("Page budget: {}", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserKind, CategorizeConfig, Config, ContentConfig, CrawlerConfig, FetchConfig, FilterConfig,
    OutputConfig, PaginationConfig, SitemapConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
