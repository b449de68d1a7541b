//! Crawler coordinator - phase sequencing for one crawl run
//!
//! A run walks these phases, each only adding to the shared frontier:
//! 1. robots.txt and sitemap discovery
//! 2. strategic link harvesting from the seed page
//! 3. category and pagination traversal with a bounded worker pool
//! 4. optional dynamic discovery on a sample of category pages
//! 5. exhaustive breadth-first traversal of whatever is left
//!
//! The coordinator owns the frontier and all statistics. Workers only fetch
//! and extract; their results are applied here one at a time.

use crate::config::{validate, BrowserKind, Config};
use crate::content::{ContentDocument, ContentExtractor};
use crate::crawler::progress::{ProgressCallback, ProgressEvent, ProgressPhase};
use crate::crawler::worker::{PageVisit, PageWorker};
use crate::discovery::{LinkExtractor, PaginationSynthesizer, UrlCategory};
use crate::fetch::{Browser, FetchLayer, Fingerprint, Interaction};
use crate::frontier::{AddOutcome, CrawlPhase, CrawlTarget, Frontier};
use crate::output::{CategoryCounts, DiscoveryReport};
use crate::robots::{fetch_robots, ParsedRobots};
use crate::sitemap::SitemapResolver;
use crate::store::ContentStore;
use crate::url::normalize_url;
use crate::SweepError;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use rand::seq::SliceRandom;
use reqwest::Client;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Pages pulled from the frontier per batch, per worker
const BATCH_PER_WORKER: usize = 4;

/// Content hashes and members of one synthesized pagination series
#[derive(Debug, Default)]
struct PaginationSeries {
    hashes: HashSet<String>,
    members: Vec<Url>,
    exhausted: bool,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    seed: Url,
    frontier: Frontier,
    worker: PageWorker,
    client: Client,
    store: Arc<dyn ContentStore>,
    pagination: PaginationSynthesizer,
    progress: Option<ProgressCallback>,
    /// Series key -> state
    series: HashMap<String, PaginationSeries>,
    /// Synthesized candidate URL -> series key
    synthesized: HashMap<String, String>,
    visits: usize,
}

impl Coordinator {
    /// Creates a coordinator for one crawl
    ///
    /// # Arguments
    ///
    /// * `seed` - Starting URL; must be an absolute http(s) URL
    /// * `config` - The crawler configuration
    /// * `store` - Destination for extracted content
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(SweepError::Validation)` - The seed is empty or malformed
    /// * `Err(SweepError::Config)` - The configuration is invalid
    pub fn new(
        seed: &str,
        config: Config,
        store: Arc<dyn ContentStore>,
    ) -> Result<Self, SweepError> {
        let seed = parse_seed(seed)?;
        validate(&config)?;

        let fetcher = FetchLayer::http(config.fetch.clone(), config.crawler.delay_ms);

        let client = Client::builder()
            .default_headers(Fingerprint::random().headers())
            .timeout(Duration::from_millis(config.sitemap.timeout_ms))
            .gzip(true)
            .brotli(true)
            .build()?;

        let frontier = Frontier::new(seed.clone(), &config)?;
        let worker = PageWorker::new(
            fetcher,
            LinkExtractor::new(),
            ContentExtractor::new(&config.content),
        );
        let pagination = PaginationSynthesizer::new(&config.pagination);

        Ok(Self {
            config,
            seed,
            frontier,
            worker,
            client,
            store,
            pagination,
            progress: None,
            series: HashMap::new(),
            synthesized: HashMap::new(),
            visits: 0,
        })
    }

    /// Creates a coordinator whose fetches use the configured browser
    ///
    /// Same as [`Coordinator::new`], but with `browser = "chrome"` in the
    /// `[fetch]` table this launches Chrome first.
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(SweepError::Validation | SweepError::Config)` - As for `new`
    /// * `Err(SweepError::Fetch)` - Chrome could not be launched
    pub async fn launch(
        seed: &str,
        config: Config,
        store: Arc<dyn ContentStore>,
    ) -> Result<Self, SweepError> {
        let mut coordinator = Self::new(seed, config, store)?;
        if coordinator.config.fetch.browser != BrowserKind::Http {
            let fetcher = FetchLayer::launch(
                coordinator.config.fetch.clone(),
                coordinator.config.crawler.delay_ms,
            )
            .await?;
            coordinator.install_fetcher(fetcher);
        }
        Ok(coordinator)
    }

    /// Replaces the browser used for page fetches
    pub fn with_browser(mut self, browser: Arc<dyn Browser>) -> Self {
        let fetcher = FetchLayer::new(
            browser,
            self.config.fetch.clone(),
            self.config.crawler.delay_ms,
        );
        self.install_fetcher(fetcher);
        self
    }

    fn install_fetcher(&mut self, fetcher: FetchLayer) {
        self.worker = PageWorker::new(
            fetcher,
            LinkExtractor::new(),
            ContentExtractor::new(&self.config.content),
        );
    }

    /// Installs a progress listener
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    pub fn seed(&self) -> &Url {
        &self.seed
    }

    /// Runs every phase and returns the discovery report
    ///
    /// Only construction can fail; errors during the crawl are logged and
    /// counted in the report's statistics. Dropping the returned future
    /// cancels the crawl and closes any open sessions.
    pub async fn run(mut self) -> DiscoveryReport {
        let started_at = Utc::now();
        info!("Starting crawl of {}", self.seed);

        self.discover_sitemaps().await;
        self.harvest_strategic_links().await;

        if self.config.crawler.enable_category_traversal {
            self.traverse_categories().await;
        }

        if self.config.crawler.enable_dynamic_discovery {
            self.discover_dynamic().await;
        }

        self.exhaust().await;

        let report = self.build_report(started_at);
        info!(
            "Crawl complete: {} pages visited, {} URLs discovered, {} errors",
            report.total_pages, report.total_discovered, report.stats.errors_encountered
        );
        self.emit(ProgressPhase::Finished, "Crawl complete".to_string());
        report
    }

    /// Phase 1: robots.txt, seed admission and sitemap URLs
    async fn discover_sitemaps(&mut self) {
        let timeout = Duration::from_millis(self.config.sitemap.timeout_ms);
        let robots = fetch_robots(&self.client, &self.seed, timeout).await;

        if self.config.crawler.respect_robots {
            let agent = self.config.crawler.robots_agent.clone();
            if let Some(delay) = robots.crawl_delay(&agent) {
                let ms = (delay * 1000.0).round() as u64;
                info!("Honoring robots.txt Crawl-delay of {}ms", ms);
                self.worker.fetcher().set_min_delay(ms);
            }
            self.frontier.set_robots(robots.clone(), &agent);
        }

        let seed = self.seed.to_string();
        match self.frontier.try_add(&seed, 0, CrawlPhase::Seed) {
            AddOutcome::Added { .. } => {}
            other => warn!("Seed {} not admitted: {:?}", seed, other),
        }

        if self.config.sitemap.enabled {
            self.add_sitemap_urls(&robots).await;
        }

        self.emit(
            ProgressPhase::Sitemap,
            format!("{} URLs discovered", self.frontier.discovered_count()),
        );
    }

    async fn add_sitemap_urls(&mut self, robots: &ParsedRobots) {
        let resolver = SitemapResolver::new(self.client.clone(), &self.config.sitemap);
        let outcome = resolver.resolve(&self.seed, robots).await;

        self.frontier.stats_mut().errors_encountered += outcome.errors;

        let mut added = 0;
        for url in &outcome.urls {
            if self.frontier.add(url, 1, CrawlPhase::Sitemap) {
                added += 1;
            }
        }
        info!(
            "Sitemaps yielded {} URLs, {} new",
            outcome.urls.len(),
            added
        );
    }

    /// Phase 2: fetch the seed and take its navigation links first
    async fn harvest_strategic_links(&mut self) {
        let seed = self.seed.clone();
        let Some(target) = self.frontier.take(&seed) else {
            debug!("Seed not pending; skipping strategic link harvest");
            return;
        };
        if self.frontier.remaining_budget() == 0 {
            return;
        }

        let visit = self.worker.visit(target, Interaction::Standard).await;
        self.apply_visit(visit, CrawlPhase::StrategicLinks).await;

        self.emit(
            ProgressPhase::StrategicLinks,
            format!("{} URLs discovered", self.frontier.discovered_count()),
        );
    }

    /// Phase 3: category and pagination pages through the worker pool
    async fn traverse_categories(&mut self) {
        let concurrency = self.config.crawler.concurrency.max(1);
        let buckets = [UrlCategory::Category, UrlCategory::Pagination];

        loop {
            let budget = self.frontier.remaining_budget();
            if budget == 0 {
                break;
            }
            let batch = self
                .frontier
                .take_pending(&buckets, budget.min(concurrency * BATCH_PER_WORKER));
            if batch.is_empty() {
                break;
            }
            debug!("Category batch of {} pages", batch.len());
            self.run_batch(batch, concurrency, Interaction::Standard, CrawlPhase::CategoryTraversal)
                .await;
        }

        self.emit(
            ProgressPhase::CategoryTraversal,
            format!(
                "{} pages visited, {} pending",
                self.frontier.visited_count(),
                self.frontier.pending_count()
            ),
        );
    }

    /// Phase 4: re-open sampled category pages with exhaustive interaction
    async fn discover_dynamic(&mut self) {
        let sample: Vec<CrawlTarget> = {
            let candidates = self.frontier.visited_successfully(UrlCategory::Category);
            let mut rng = rand::thread_rng();
            candidates
                .choose_multiple(&mut rng, self.config.crawler.dynamic_sample_size)
                .cloned()
                .collect()
        };

        info!("Dynamic discovery on {} category pages", sample.len());
        let before = self.frontier.discovered_count();

        for target in sample {
            let visit = self.worker.visit(target, Interaction::Exhaustive).await;
            self.apply_rediscovery(visit);
        }

        self.emit(
            ProgressPhase::DynamicDiscovery,
            format!(
                "{} new URLs",
                self.frontier.discovered_count().saturating_sub(before)
            ),
        );
    }

    /// Phase 5: breadth-first over everything still pending
    async fn exhaust(&mut self) {
        let concurrency = self.config.crawler.bfs_concurrency.max(1);

        while !self.frontier.is_exhausted() {
            let limit = self.frontier.remaining_budget().min(concurrency);
            let batch: Vec<CrawlTarget> = (0..limit).map_while(|_| self.frontier.next()).collect();
            if batch.is_empty() {
                break;
            }
            self.run_batch(batch, concurrency, Interaction::Standard, CrawlPhase::Exhaustive)
                .await;
        }

        if self.frontier.remaining_budget() == 0 {
            info!(
                "Page budget of {} reached with {} URLs pending",
                self.config.crawler.max_pages,
                self.frontier.pending_count()
            );
        }
        self.emit(
            ProgressPhase::Exhaustive,
            format!("{} pages visited", self.frontier.visited_count()),
        );
    }

    /// Visits a batch with at most `concurrency` fetches in flight
    async fn run_batch(
        &mut self,
        batch: Vec<CrawlTarget>,
        concurrency: usize,
        interaction: Interaction,
        phase: CrawlPhase,
    ) {
        let worker = self.worker.clone();
        let mut visits = stream::iter(batch)
            .map(|target| {
                let worker = worker.clone();
                async move { worker.visit(target, interaction).await }
            })
            .buffer_unordered(concurrency);

        while let Some(visit) = visits.next().await {
            self.apply_visit(visit, phase).await;
        }
    }

    /// Folds one visit into the frontier, statistics and content store
    async fn apply_visit(&mut self, visit: PageVisit, phase: CrawlPhase) {
        let PageVisit {
            target,
            fetch,
            links,
            document,
        } = visit;

        let success = fetch.is_success();
        self.frontier.mark_visited(&target.url, success);
        self.visits += 1;
        self.report_periodic(phase);

        if !success {
            let stats = self.frontier.stats_mut();
            stats.errors_encountered += 1;
            if fetch.blocked {
                stats.blocked_pages += 1;
            }
            match &fetch.error {
                Some(e) => warn!("Giving up on {}: {}", target.url, e),
                None => warn!("Giving up on {}", target.url),
            }
            self.end_series_of(&target.url);
            return;
        }
        self.frontier.stats_mut().pages_fetched += 1;

        let series_ended = match &document {
            Some(doc) => self.check_series(&target.url, doc.as_ref().ok()),
            None => false,
        };

        let depth = target.depth + 1;
        let (strategic, rest): (Vec<_>, Vec<_>) =
            links.into_iter().partition(|link| link.role.is_strategic());
        for link in strategic.iter().chain(rest.iter()) {
            self.frontier.try_add(link.url.as_str(), depth, phase);
        }

        if self.config.crawler.enable_pagination
            && target.category == UrlCategory::Category
            && !self.synthesized.contains_key(target.url.as_str())
        {
            let hash = match &document {
                Some(Ok(doc)) => Some(doc.content_hash.clone()),
                _ => None,
            };
            self.synthesize_pagination(&target, hash);
        }

        match document {
            Some(Ok(doc)) if !series_ended => self.store_document(doc).await,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                debug!("No content from {}: {}", target.url, e);
                self.frontier.stats_mut().errors_encountered += 1;
            }
            None => {}
        }
    }

    /// Applies a dynamic-discovery revisit: links and sub-resources only
    fn apply_rediscovery(&mut self, visit: PageVisit) {
        if !visit.fetch.is_success() {
            warn!("Dynamic discovery fetch failed for {}", visit.target.url);
            self.frontier.stats_mut().errors_encountered += 1;
            return;
        }

        let depth = visit.target.depth + 1;
        let found = visit
            .links
            .iter()
            .map(|link| &link.url)
            .chain(visit.fetch.subresources.iter());

        let mut added = 0;
        for url in found {
            if self
                .frontier
                .add(url.as_str(), depth, CrawlPhase::DynamicDiscovery)
            {
                added += 1;
            }
        }
        debug!("Dynamic discovery on {} added {} URLs", visit.target.url, added);
    }

    /// Queues pagination candidates for a fetched listing page
    fn synthesize_pagination(&mut self, listing: &CrawlTarget, content_hash: Option<String>) {
        let candidates = self.pagination.synthesize(&listing.url);
        let Some(key) = candidates.first().map(|c| c.series.clone()) else {
            return;
        };

        let series = self.series.entry(key.clone()).or_default();
        if series.exhausted {
            return;
        }
        if let Some(hash) = content_hash {
            series.hashes.insert(hash);
        }

        let depth = listing.depth + 1;
        let mut members = Vec::new();
        for candidate in candidates {
            if let AddOutcome::Added { url, .. } =
                self.frontier
                    .try_add(candidate.url.as_str(), depth, CrawlPhase::Pagination)
            {
                self.synthesized.insert(url.to_string(), key.clone());
                members.push(url);
            }
        }

        let queued = members.len();
        if let Some(series) = self.series.get_mut(&key) {
            series.members.extend(members);
        }
        debug!("Queued {} pagination candidates for {}", queued, listing.url);
    }

    /// Records a synthesized page's content; returns true if its series ended
    ///
    /// A series ends at the first candidate that is empty or repeats content
    /// already seen in the series.
    fn check_series(&mut self, url: &Url, document: Option<&ContentDocument>) -> bool {
        let Some(key) = self.synthesized.get(url.as_str()).cloned() else {
            return false;
        };
        let Some(series) = self.series.get_mut(&key) else {
            return false;
        };

        let ended = match document {
            Some(doc) => !series.hashes.insert(doc.content_hash.clone()),
            None => true,
        };
        if ended {
            debug!("Pagination series {} ends at {}", key, url);
            self.prune_series(&key);
        }
        ended
    }

    fn end_series_of(&mut self, url: &Url) {
        if let Some(key) = self.synthesized.get(url.as_str()).cloned() {
            self.prune_series(&key);
        }
    }

    /// Abandons every still-pending candidate of a series
    fn prune_series(&mut self, key: &str) {
        let Some(series) = self.series.get_mut(key) else {
            return;
        };
        series.exhausted = true;

        let mut pruned = 0;
        for member in &series.members {
            if self.frontier.abandon(member) {
                pruned += 1;
            }
        }
        if pruned > 0 {
            info!("Pruned {} pagination candidates of {}", pruned, key);
        }
        self.frontier.stats_mut().pagination_pruned += pruned;
    }

    async fn store_document(&mut self, doc: ContentDocument) {
        let key = doc.storage_key();
        match self.store.put(&key, &doc).await {
            Ok(()) => {
                let stats = self.frontier.stats_mut();
                stats.documents_stored += 1;
                stats.chunks_emitted += doc.chunks.len();
            }
            Err(e) => {
                warn!("Failed to store content of {}: {}", doc.url, e);
                self.frontier.stats_mut().errors_encountered += 1;
            }
        }
    }

    fn report_periodic(&self, phase: CrawlPhase) {
        let interval = self.config.crawler.progress_interval;
        if interval == 0 || self.visits % interval != 0 {
            return;
        }
        info!(
            "Progress: {} pages visited, {} pending, {} discovered",
            self.frontier.visited_count(),
            self.frontier.pending_count(),
            self.frontier.discovered_count()
        );
        let progress_phase = match phase {
            CrawlPhase::StrategicLinks | CrawlPhase::Seed => ProgressPhase::StrategicLinks,
            CrawlPhase::CategoryTraversal | CrawlPhase::Pagination => {
                ProgressPhase::CategoryTraversal
            }
            CrawlPhase::DynamicDiscovery => ProgressPhase::DynamicDiscovery,
            CrawlPhase::Sitemap | CrawlPhase::Exhaustive => ProgressPhase::Exhaustive,
        };
        self.emit(
            progress_phase,
            format!("{} pages visited", self.frontier.visited_count()),
        );
    }

    fn emit(&self, phase: ProgressPhase, message: String) {
        if let Some(callback) = &self.progress {
            callback(ProgressEvent::new(
                phase,
                message,
                self.frontier.visited_count(),
                self.config.crawler.max_pages,
            ));
        }
    }

    fn build_report(&self, started_at: DateTime<Utc>) -> DiscoveryReport {
        DiscoveryReport {
            seed: self.seed.to_string(),
            started_at,
            finished_at: Utc::now(),
            total_pages: self.frontier.visited_count(),
            total_discovered: self.frontier.discovered_count(),
            by_category: CategoryCounts::from(&self.frontier.category_counts()),
            discovered_urls: self.frontier.discovered_urls(),
            stats: self.frontier.stats().clone(),
        }
    }
}

fn parse_seed(raw: &str) -> Result<Url, SweepError> {
    if raw.trim().is_empty() {
        return Err(SweepError::Validation {
            url: raw.to_string(),
            reason: "seed URL is empty".to_string(),
        });
    }
    normalize_url(raw).map_err(|e| SweepError::Validation {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}
