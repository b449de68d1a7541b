//! URL discovery helpers
//!
//! This module provides:
//! - URL categorization into category/pagination/product/content buckets
//! - Pagination candidate synthesis for listing pages
//! - Role-tagged link extraction from fetched HTML

mod categorize;
mod links;
mod pagination;

pub use categorize::{Categorizer, UrlCategory};
pub use links::{ExtractedLink, LinkExtractor, LinkRole, LINK_SELECTOR_GROUPS};
pub use pagination::{
    detect_marker, series_key, PageCandidate, PaginationSynthesizer, PaginationTemplate,
};
