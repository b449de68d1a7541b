//! Deepsweep main entry point
//!
//! This is the command-line interface for the Deepsweep site discovery crawler.

use anyhow::{bail, Context, Result};
use clap::Parser;
use deepsweep::config::{load_config_with_hash, validate, Config};
use deepsweep::crawler::Coordinator;
use deepsweep::output::{generate_markdown_summary, print_statistics};
use deepsweep::store::JsonDirStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Deepsweep: discovery-and-crawl engine for a single website
///
/// Deepsweep resolves a site's sitemaps, follows its navigation, categories
/// and pagination within a page budget, and writes the extracted text of every
/// page as content-addressed chunks.
#[derive(Parser, Debug)]
#[command(name = "deepsweep")]
#[command(version)]
#[command(about = "Discover and crawl one website", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Seed URL (overrides `seed` in the configuration)
    #[arg(long, value_name = "URL")]
    seed: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Where to write the JSON report (overrides `output.report-path`)
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(report) = cli.report {
        config.output.report_path = report.to_string_lossy().into_owned();
    }

    let Some(seed) = config.seed.clone() else {
        bail!("No seed URL: pass --seed or set `seed` in the configuration");
    };

    if cli.dry_run {
        handle_dry_run(&seed, &config)
    } else {
        handle_crawl(&seed, config, &config_hash).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("deepsweep=info,warn"),
            1 => EnvFilter::new("deepsweep=debug,info"),
            2 => EnvFilter::new("deepsweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --dry-run: validates the configuration and prints the plan
fn handle_dry_run(seed: &str, config: &Config) -> Result<()> {
    validate(config).context("Invalid configuration")?;
    let seed = deepsweep::normalize_url(seed).with_context(|| format!("Invalid seed '{}'", seed))?;

    println!("=== Deepsweep Dry Run ===\n");
    println!("Seed: {}\n", seed);

    println!("Crawler:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Base delay: {}ms", config.crawler.delay_ms);
    println!(
        "  Concurrency: {} (exhaustive phase: {})",
        config.crawler.concurrency, config.crawler.bfs_concurrency
    );
    println!("  Pagination: {}", config.crawler.enable_pagination);
    println!("  Category traversal: {}", config.crawler.enable_category_traversal);
    println!("  Dynamic discovery: {}", config.crawler.enable_dynamic_discovery);
    println!("  External links: {}", config.crawler.follow_external_links);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots);

    println!("\nFetch:");
    println!("  Attempts: {}", config.fetch.max_attempts);
    println!("  Navigation timeout: {}ms", config.fetch.navigation_timeout_ms);
    println!("  Browser: {:?}", config.fetch.browser);
    println!("  Human simulation: {}", config.fetch.human_simulation);

    println!("\nFilters:");
    println!("  Exclude patterns: {}", config.filters.exclude_patterns.len());
    println!("  Excluded extensions: {}", config.filters.excluded_extensions.len());
    println!("  Allowed domains: {}", config.filters.allowed_domains.len());

    println!("\nOutput:");
    println!("  Report: {}", config.output.report_path);
    println!("  Summary: {}", config.output.summary_path);
    println!("  Content: {}", config.output.content_dir);

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(seed: &str, config: Config, config_hash: &str) -> Result<()> {
    let report_path = PathBuf::from(&config.output.report_path);
    let summary_path = PathBuf::from(&config.output.summary_path);
    let store = Arc::new(JsonDirStore::new(&config.output.content_dir));

    let coordinator = Coordinator::launch(seed, config, store)
        .await?
        .on_progress(|event| {
            tracing::debug!(
                "[{}] {:.0}% {}",
                event.phase,
                event.percentage,
                event.message
            )
        });

    let report = tokio::select! {
        report = coordinator.run() => report,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted; in-flight fetches cancelled, no report written");
            return Ok(());
        }
    };

    report
        .write_json(&report_path)
        .with_context(|| format!("Failed to write {}", report_path.display()))?;
    tracing::info!("Report written to {}", report_path.display());

    if !summary_path.as_os_str().is_empty() {
        write_summary(&report, config_hash, &summary_path)?;
    }

    print_statistics(&report);
    Ok(())
}

fn write_summary(
    report: &deepsweep::DiscoveryReport,
    config_hash: &str,
    path: &Path,
) -> Result<()> {
    generate_markdown_summary(report, config_hash, path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Summary written to {}", path.display());
    Ok(())
}
