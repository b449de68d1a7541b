//! Markdown summary generation
//!
//! Renders a human-readable summary of a discovery report: run timing,
//! discovery counts per bucket, fetch outcomes and a sample of URLs.

use crate::output::{DiscoveryReport, OutputResult};
use std::fs;
use std::path::Path;

/// Number of discovered URLs listed in the summary
const URL_SAMPLE: usize = 50;

/// Writes a markdown summary of `report` to `output_path`
///
/// # Arguments
///
/// * `report` - The finished crawl report
/// * `config_hash` - Hash of the configuration file the run used
/// * `output_path` - Destination file
pub fn generate_markdown_summary(
    report: &DiscoveryReport,
    config_hash: &str,
    output_path: &Path,
) -> OutputResult<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_path, format_markdown_summary(report, config_hash))?;
    Ok(())
}

/// Formats a discovery report as markdown
pub fn format_markdown_summary(report: &DiscoveryReport, config_hash: &str) -> String {
    let stats = &report.stats;
    let mut md = String::new();

    md.push_str("# Deepsweep Crawl Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Seed**: {}\n", report.seed));
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", report.finished_at.to_rfc3339()));
    let duration = report.duration_seconds();
    md.push_str(&format!(
        "- **Duration**: {} seconds ({:.2} minutes)\n",
        duration,
        duration as f64 / 60.0
    ));
    md.push_str(&format!("- **Config Hash**: {}\n\n", config_hash));

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Pages Visited**: {}\n", report.total_pages));
    md.push_str(&format!("- **URLs Discovered**: {}\n", report.total_discovered));
    md.push_str(&format!("- **Pages Fetched**: {}\n", stats.pages_fetched));
    md.push_str(&format!("- **Blocked Pages**: {}\n", stats.blocked_pages));
    md.push_str(&format!("- **Errors**: {}\n", stats.errors_encountered));
    md.push_str(&format!("- **Success Rate**: {:.2}%\n\n", report.success_rate()));

    md.push_str("## Discovered by Category\n\n");
    md.push_str("| Category | Count |\n");
    md.push_str("|----------|-------|\n");
    md.push_str(&format!("| Category | {} |\n", report.by_category.category));
    md.push_str(&format!("| Pagination | {} |\n", report.by_category.pagination));
    md.push_str(&format!("| Product | {} |\n", report.by_category.product));
    md.push_str(&format!("| Content | {} |\n\n", report.by_category.content));

    md.push_str("## Content\n\n");
    md.push_str(&format!("- **Documents Stored**: {}\n", stats.documents_stored));
    md.push_str(&format!("- **Chunks Emitted**: {}\n\n", stats.chunks_emitted));

    md.push_str("## Frontier\n\n");
    md.push_str(&format!("- **Duplicates Skipped**: {}\n", stats.duplicates_skipped));
    md.push_str(&format!("- **Filtered Out**: {}\n", stats.filtered_out));
    md.push_str(&format!(
        "- **Pagination Candidates Pruned**: {}\n\n",
        stats.pagination_pruned
    ));

    if !report.discovered_urls.is_empty() {
        md.push_str("## Discovered URLs\n\n");
        for url in report.discovered_urls.iter().take(URL_SAMPLE) {
            md.push_str(&format!("- {}\n", url));
        }
        if report.discovered_urls.len() > URL_SAMPLE {
            md.push_str(&format!(
                "\n... and {} more\n",
                report.discovered_urls.len() - URL_SAMPLE
            ));
        }
        md.push('\n');
    }

    md
}
