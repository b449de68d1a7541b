use crate::config::CategorizeConfig;
use crate::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// The bucket a discovered URL falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlCategory {
    /// Listing or department page
    Category,
    /// A numbered page of a listing
    Pagination,
    /// Single product or item detail page
    Product,
    /// Anything else
    Content,
}

impl UrlCategory {
    pub const ALL: [UrlCategory; 4] = [
        UrlCategory::Category,
        UrlCategory::Pagination,
        UrlCategory::Product,
        UrlCategory::Content,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Pagination => "pagination",
            Self::Product => "product",
            Self::Content => "content",
        }
    }
}

impl fmt::Display for UrlCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const CATEGORY_PATTERNS: &[&str] = &[
    r"/(category|categories|collection|collections|department|departments|catalog|catalogue|browse|cat|c)/[^/]+",
    r"[?&](category|cat|category_id|cid)=",
    r"^/shop/[^/]+/?$",
];

const PAGINATION_PATTERNS: &[&str] = &[
    r"[?&](page|p|pg|paged|offset|start)=\d+",
    r"/page/\d+/?$",
    r"/p/\d+/?$",
    r"[-_/]page[-_]?\d+/?$",
];

const PRODUCT_PATTERNS: &[&str] = &[
    r"/(product|products|item|items|dp|pd|sku)/[^/]+",
    r"/p/[^/]+",
    r"-p-\d+",
    r"[?&](product_id|pid|sku|item_id)=",
    r"/[a-z0-9-]+-\d{5,}(\.html?)?/?$",
];

/// Classifies URLs into exactly one [`UrlCategory`]
///
/// Buckets are checked in a fixed order (category, pagination, product) and
/// the first bucket with a matching pattern wins; `Content` is the default.
/// Matching runs on the lowercased path plus query, so classification does
/// not depend on host or fragment.
#[derive(Debug, Clone)]
pub struct Categorizer {
    category: Vec<Regex>,
    pagination: Vec<Regex>,
    product: Vec<Regex>,
}

impl Categorizer {
    /// Compiles the built-in patterns plus any site-specific extras
    pub fn new(extra: &CategorizeConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            category: compile(CATEGORY_PATTERNS, &extra.category_patterns)?,
            pagination: compile(PAGINATION_PATTERNS, &extra.pagination_patterns)?,
            product: compile(PRODUCT_PATTERNS, &extra.product_patterns)?,
        })
    }

    /// Returns the bucket for `url`
    pub fn classify(&self, url: &Url) -> UrlCategory {
        let target = match url.query() {
            Some(q) => format!("{}?{}", url.path(), q),
            None => url.path().to_string(),
        }
        .to_lowercase();

        let buckets = [
            (&self.category, UrlCategory::Category),
            (&self.pagination, UrlCategory::Pagination),
            (&self.product, UrlCategory::Product),
        ];

        for (patterns, category) in buckets {
            if patterns.iter().any(|re| re.is_match(&target)) {
                return category;
            }
        }

        UrlCategory::Content
    }
}

impl Default for Categorizer {
    fn default() -> Self {
        // Built-in patterns are constants and always compile
        Self {
            category: CATEGORY_PATTERNS.iter().filter_map(|p| Regex::new(p).ok()).collect(),
            pagination: PAGINATION_PATTERNS.iter().filter_map(|p| Regex::new(p).ok()).collect(),
            product: PRODUCT_PATTERNS.iter().filter_map(|p| Regex::new(p).ok()).collect(),
        }
    }
}

fn compile(builtin: &[&str], extra: &[String]) -> Result<Vec<Regex>, ConfigError> {
    builtin
        .iter()
        .copied()
        .chain(extra.iter().map(String::as_str))
        .map(|p| {
            Regex::new(p).map_err(|e| {
                ConfigError::InvalidPattern(format!("Invalid categorize pattern '{}': {}", p, e))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(s: &str) -> UrlCategory {
        Categorizer::default().classify(&Url::parse(s).unwrap())
    }

    #[test]
    fn test_category_urls() {
        assert_eq!(classify("https://s.test/collections/shoes"), UrlCategory::Category);
        assert_eq!(classify("https://s.test/category/men/shirts"), UrlCategory::Category);
        assert_eq!(classify("https://s.test/list?cat=12"), UrlCategory::Category);
        assert_eq!(classify("https://s.test/shop/outdoor"), UrlCategory::Category);
    }

    #[test]
    fn test_pagination_urls() {
        assert_eq!(classify("https://s.test/sale?page=3"), UrlCategory::Pagination);
        assert_eq!(classify("https://s.test/blog/page/2"), UrlCategory::Pagination);
        assert_eq!(classify("https://s.test/list?offset=48"), UrlCategory::Pagination);
    }

    #[test]
    fn test_product_urls() {
        assert_eq!(classify("https://s.test/products/red-shoe"), UrlCategory::Product);
        assert_eq!(classify("https://s.test/p/red-shoe"), UrlCategory::Product);
        assert_eq!(classify("https://s.test/item?pid=44"), UrlCategory::Product);
        assert_eq!(
            classify("https://s.test/red-running-shoe-123456.html"),
            UrlCategory::Product
        );
    }

    #[test]
    fn test_content_default() {
        assert_eq!(classify("https://s.test/"), UrlCategory::Content);
        assert_eq!(classify("https://s.test/about-us"), UrlCategory::Content);
    }

    #[test]
    fn test_category_precedes_pagination() {
        assert_eq!(
            classify("https://s.test/collections/shoes?page=2"),
            UrlCategory::Category
        );
    }

    #[test]
    fn test_pagination_precedes_product() {
        assert_eq!(classify("https://s.test/p/2"), UrlCategory::Pagination);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("https://s.test/Products/X"), UrlCategory::Product);
    }

    #[test]
    fn test_deterministic() {
        let categorizer = Categorizer::default();
        let url = Url::parse("https://s.test/category/a?page=9").unwrap();
        let first = categorizer.classify(&url);
        for _ in 0..10 {
            assert_eq!(categorizer.classify(&url), first);
        }
    }

    #[test]
    fn test_extra_patterns() {
        let extra = CategorizeConfig {
            product_patterns: vec![r"^/buy/".to_string()],
            ..Default::default()
        };
        let categorizer = Categorizer::new(&extra).unwrap();
        let url = Url::parse("https://s.test/buy/thing").unwrap();
        assert_eq!(categorizer.classify(&url), UrlCategory::Product);
    }

    #[test]
    fn test_invalid_extra_pattern() {
        let extra = CategorizeConfig {
            category_patterns: vec!["(".to_string()],
            ..Default::default()
        };
        assert!(Categorizer::new(&extra).is_err());
    }
}
