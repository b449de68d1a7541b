//! Crawler module for site discovery
//!
//! This module contains the crawl orchestration, including:
//! - Phase sequencing and budget enforcement (`Coordinator`)
//! - Stateless page workers that fetch and extract
//! - Progress reporting to an injected listener

mod coordinator;
mod progress;
mod worker;

pub use coordinator::Coordinator;
pub use progress::{ProgressCallback, ProgressEvent, ProgressPhase};
pub use worker::{PageVisit, PageWorker};

use crate::config::Config;
use crate::output::DiscoveryReport;
use crate::store::ContentStore;
use crate::SweepError;
use std::sync::Arc;

/// Runs a complete crawl of `seed`
///
/// This is the main entry point for embedding. It will:
/// 1. Validate the seed and configuration
/// 2. Resolve robots.txt and sitemaps
/// 3. Traverse navigation, categories and pagination
/// 4. Visit the remaining frontier within the page budget
/// 5. Hand every extracted document to `store`
///
/// # Arguments
///
/// * `seed` - Starting URL
/// * `config` - The crawler configuration
/// * `store` - Destination for extracted content
///
/// # Returns
///
/// * `Ok(DiscoveryReport)` - Crawl finished
/// * `Err(SweepError)` - The seed or configuration was rejected, or the
///   configured browser could not be launched
pub async fn crawl(
    seed: &str,
    config: Config,
    store: Arc<dyn ContentStore>,
) -> Result<DiscoveryReport, SweepError> {
    let coordinator = Coordinator::launch(seed, config, store).await?;
    Ok(coordinator.run().await)
}
