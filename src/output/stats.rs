//! Crawl statistics
//!
//! Counters are owned by the frontier and the coordinator during a run and
//! copied into the final report.

use crate::discovery::UrlCategory;
use crate::output::DiscoveryReport;
use serde::{Deserialize, Serialize};

/// Counters accumulated over one crawl
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlStats {
    /// Category pages discovered
    pub categories_found: usize,

    /// Pagination pages discovered
    pub pagination_found: usize,

    /// Product pages discovered
    pub products_found: usize,

    /// Pages discovered that fit no other bucket
    pub content_pages_found: usize,

    /// URLs offered again after being discovered
    pub duplicates_skipped: usize,

    /// Failed fetches, extraction failures and store failures
    pub errors_encountered: usize,

    /// Fetches that produced usable HTML
    pub pages_fetched: usize,

    /// Fetches that ended blocked
    pub blocked_pages: usize,

    pub documents_stored: usize,
    pub chunks_emitted: usize,

    /// URLs rejected by scope, filters, robots.txt or depth
    pub filtered_out: usize,

    /// Synthesized pagination candidates dropped after their series ran out
    pub pagination_pruned: usize,
}

impl CrawlStats {
    /// Bumps the discovery counter for `category`
    pub fn record_discovery(&mut self, category: UrlCategory) {
        match category {
            UrlCategory::Category => self.categories_found += 1,
            UrlCategory::Pagination => self.pagination_found += 1,
            UrlCategory::Product => self.products_found += 1,
            UrlCategory::Content => self.content_pages_found += 1,
        }
    }

    /// Total URLs discovered across all buckets
    pub fn total_discovered(&self) -> usize {
        self.categories_found
            + self.pagination_found
            + self.products_found
            + self.content_pages_found
    }
}

/// Prints a report's statistics to stdout
///
/// # Arguments
///
/// * `report` - The finished crawl report
pub fn print_statistics(report: &DiscoveryReport) {
    let stats = &report.stats;
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Seed: {}", report.seed);
    println!("  Pages visited: {}", report.total_pages);
    println!("  URLs discovered: {}", report.total_discovered);
    println!("  Duration: {}s", report.duration_seconds());
    println!();

    println!("Discovered by Category:");
    let by_category = [
        ("category", report.by_category.category),
        ("pagination", report.by_category.pagination),
        ("product", report.by_category.product),
        ("content", report.by_category.content),
    ];
    for (name, count) in by_category {
        let percentage = if report.total_discovered > 0 {
            (count as f64 / report.total_discovered as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", name, count, percentage);
    }
    println!();

    println!("Fetching:");
    println!("  Fetched: {}", stats.pages_fetched);
    println!("  Blocked: {}", stats.blocked_pages);
    println!("  Errors: {}", stats.errors_encountered);
    println!();

    println!("Content:");
    println!("  Documents stored: {}", stats.documents_stored);
    println!("  Chunks emitted: {}", stats.chunks_emitted);
    println!();

    println!("Frontier:");
    println!("  Duplicates skipped: {}", stats.duplicates_skipped);
    println!("  Filtered out: {}", stats.filtered_out);
    println!("  Pagination pruned: {}", stats.pagination_pruned);
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} pages fetched successfully)",
        report.success_rate(),
        stats.pages_fetched,
        report.total_pages
    );
}
