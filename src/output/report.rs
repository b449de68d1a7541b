//! Final discovery report

use crate::discovery::UrlCategory;
use crate::output::{CrawlStats, OutputResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Discovered URL counts per bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub category: usize,
    pub pagination: usize,
    pub product: usize,
    pub content: usize,
}

impl CategoryCounts {
    pub fn get(&self, category: UrlCategory) -> usize {
        match category {
            UrlCategory::Category => self.category,
            UrlCategory::Pagination => self.pagination,
            UrlCategory::Product => self.product,
            UrlCategory::Content => self.content,
        }
    }

    pub fn total(&self) -> usize {
        self.category + self.pagination + self.product + self.content
    }
}

impl From<&HashMap<UrlCategory, usize>> for CategoryCounts {
    fn from(counts: &HashMap<UrlCategory, usize>) -> Self {
        let get = |c| counts.get(&c).copied().unwrap_or(0);
        Self {
            category: get(UrlCategory::Category),
            pagination: get(UrlCategory::Pagination),
            product: get(UrlCategory::Product),
            content: get(UrlCategory::Content),
        }
    }
}

/// Everything a crawl run produced besides the content documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryReport {
    /// Normalized seed URL
    pub seed: String,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Pages visited (fetched successfully or not)
    pub total_pages: usize,

    /// URLs discovered
    pub total_discovered: usize,

    pub by_category: CategoryCounts,

    /// Every discovered URL in discovery order
    pub discovered_urls: Vec<String>,

    pub stats: CrawlStats,
}

impl DiscoveryReport {
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds().max(0)
    }

    /// Percentage of visited pages that were fetched successfully
    pub fn success_rate(&self) -> f64 {
        if self.total_pages == 0 {
            return 0.0;
        }
        (self.stats.pages_fetched as f64 / self.total_pages as f64) * 100.0
    }

    /// Writes the report as pretty-printed JSON
    ///
    /// Parent directories are created as needed.
    pub fn write_json(&self, path: &Path) -> OutputResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    pub(crate) fn create_test_report() -> DiscoveryReport {
        let started_at = "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let finished_at = "2024-01-01T00:02:30Z".parse::<DateTime<Utc>>().unwrap();
        DiscoveryReport {
            seed: "https://shop.test/".to_string(),
            started_at,
            finished_at,
            total_pages: 40,
            total_discovered: 120,
            by_category: CategoryCounts {
                category: 10,
                pagination: 15,
                product: 80,
                content: 15,
            },
            discovered_urls: vec![
                "https://shop.test/".to_string(),
                "https://shop.test/collections/shoes".to_string(),
            ],
            stats: CrawlStats {
                pages_fetched: 30,
                errors_encountered: 10,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_counts_from_map() {
        let mut map = HashMap::new();
        map.insert(UrlCategory::Product, 4);
        map.insert(UrlCategory::Content, 1);

        let counts = CategoryCounts::from(&map);
        assert_eq!(counts.product, 4);
        assert_eq!(counts.category, 0);
        assert_eq!(counts.get(UrlCategory::Content), 1);
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn test_rates_and_duration() {
        let report = create_test_report();
        assert_eq!(report.duration_seconds(), 150);
        assert!((report.success_rate() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_write_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("report.json");
        let report = create_test_report();

        report.write_json(&path).unwrap();

        let written: DiscoveryReport =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, report);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["by_category"]["product"], 80);
        assert_eq!(raw["stats"]["errors_encountered"], 10);
    }
}
