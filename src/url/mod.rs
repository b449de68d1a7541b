//! URL handling module for Deepsweep
//!
//! This module provides URL normalization, domain scoping and the admission
//! policy every discovered URL passes before it reaches the frontier.

mod domain;
mod normalize;
mod policy;

// Re-export main functions
pub use domain::{extract_domain, is_same_site, matches_wildcard, site_host};
pub use normalize::normalize_url;
pub use policy::{Rejection, UrlPolicy};
