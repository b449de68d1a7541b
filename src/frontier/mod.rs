//! Crawl frontier
//!
//! Owns the three views over discovered URLs:
//! - `discovered`: every admitted URL, never shrinks
//! - `pending`: admitted and awaiting a fetch, FIFO
//! - `visited`: fetched, successfully or not
//!
//! Pending and visited never overlap and both are subsets of discovered.
//! All admission decisions (normalization, scope, filters, robots.txt, depth,
//! duplicates) happen in [`Frontier::try_add`].

mod target;

pub use target::{CrawlPhase, CrawlTarget};

use crate::config::Config;
use crate::discovery::{Categorizer, UrlCategory};
use crate::output::CrawlStats;
use crate::robots::ParsedRobots;
use crate::url::{Rejection, UrlPolicy};
use crate::ConfigError;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;
use url::Url;

/// What happened to a URL offered to the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added { url: Url, category: UrlCategory },
    Duplicate,
    Rejected(Rejection),
    TooDeep,
}

impl AddOutcome {
    pub fn is_added(&self) -> bool {
        matches!(self, AddOutcome::Added { .. })
    }
}

/// Discovered, pending and visited URL sets with budget enforcement
#[derive(Debug)]
pub struct Frontier {
    policy: UrlPolicy,
    categorizer: Categorizer,
    max_depth: u32,
    max_pages: usize,
    discovered: HashMap<String, CrawlTarget>,
    order: Vec<String>,
    pending: VecDeque<String>,
    pending_set: HashSet<String>,
    /// URL -> whether the fetch succeeded
    visited: HashMap<String, bool>,
    counts: HashMap<UrlCategory, usize>,
    stats: CrawlStats,
}

impl Frontier {
    /// Creates an empty frontier scoped to `seed`
    ///
    /// # Arguments
    ///
    /// * `seed` - Normalized seed URL; defines the site in scope
    /// * `config` - Supplies budgets, filters and extra category patterns
    ///
    /// # Returns
    ///
    /// * `Err(ConfigError)` - A filter or category pattern does not compile
    pub fn new(seed: Url, config: &Config) -> Result<Self, ConfigError> {
        let policy = UrlPolicy::new(seed, &config.filters, config.crawler.follow_external_links)?;
        let categorizer = Categorizer::new(&config.categorize)?;
        Ok(Self::with_parts(
            policy,
            categorizer,
            config.crawler.max_depth,
            config.crawler.max_pages,
        ))
    }

    pub fn with_parts(
        policy: UrlPolicy,
        categorizer: Categorizer,
        max_depth: u32,
        max_pages: usize,
    ) -> Self {
        Self {
            policy,
            categorizer,
            max_depth,
            max_pages,
            discovered: HashMap::new(),
            order: Vec::new(),
            pending: VecDeque::new(),
            pending_set: HashSet::new(),
            visited: HashMap::new(),
            counts: HashMap::new(),
            stats: CrawlStats::default(),
        }
    }

    /// Applies robots.txt rules to every later admission
    pub fn set_robots(&mut self, robots: ParsedRobots, agent: &str) {
        self.policy.set_robots(robots, agent);
    }

    pub fn seed(&self) -> &Url {
        self.policy.seed()
    }

    pub fn categorizer(&self) -> &Categorizer {
        &self.categorizer
    }

    /// Offers a raw URL to the frontier
    ///
    /// URLs already discovered count into `duplicates_skipped`, whatever the
    /// depth they are offered at; rejected and too-deep new URLs count into
    /// `filtered_out`. Admitted URLs are
    /// classified, counted and queued.
    pub fn try_add(&mut self, raw: &str, depth: u32, phase: CrawlPhase) -> AddOutcome {
        let url = match self.policy.admit(raw) {
            Ok(url) => url,
            Err(rejection) => {
                debug!("Rejected {} ({})", raw, rejection);
                self.stats.filtered_out += 1;
                return AddOutcome::Rejected(rejection);
            }
        };

        let key = url.to_string();
        if self.discovered.contains_key(&key) {
            self.stats.duplicates_skipped += 1;
            return AddOutcome::Duplicate;
        }

        if depth > self.max_depth {
            debug!("Rejected {} (depth {} > {})", url, depth, self.max_depth);
            self.stats.filtered_out += 1;
            return AddOutcome::TooDeep;
        }

        let category = self.categorizer.classify(&url);
        *self.counts.entry(category).or_insert(0) += 1;
        self.stats.record_discovery(category);

        self.discovered.insert(
            key.clone(),
            CrawlTarget {
                url: url.clone(),
                category,
                depth,
                phase,
            },
        );
        self.order.push(key.clone());
        self.pending.push_back(key.clone());
        self.pending_set.insert(key);

        AddOutcome::Added { url, category }
    }

    /// Offers a URL; returns whether it was newly admitted
    pub fn add(&mut self, raw: &str, depth: u32, phase: CrawlPhase) -> bool {
        self.try_add(raw, depth, phase).is_added()
    }

    /// Removes and returns the oldest pending target
    pub fn next(&mut self) -> Option<CrawlTarget> {
        let key = self.pending.pop_front()?;
        self.pending_set.remove(&key);
        self.discovered.get(&key).cloned()
    }

    /// Removes a specific URL from pending and returns it
    pub fn take(&mut self, url: &Url) -> Option<CrawlTarget> {
        let key = url.as_str();
        if !self.pending_set.remove(key) {
            return None;
        }
        self.pending.retain(|k| k != key);
        self.discovered.get(key).cloned()
    }

    /// Removes up to `limit` pending targets in the given buckets, oldest first
    pub fn take_pending(&mut self, categories: &[UrlCategory], limit: usize) -> Vec<CrawlTarget> {
        let mut taken = Vec::new();
        let mut kept = VecDeque::with_capacity(self.pending.len());

        while let Some(key) = self.pending.pop_front() {
            let matches = taken.len() < limit
                && self
                    .discovered
                    .get(&key)
                    .is_some_and(|t| categories.contains(&t.category));
            if matches {
                self.pending_set.remove(&key);
                if let Some(target) = self.discovered.get(&key) {
                    taken.push(target.clone());
                }
            } else {
                kept.push_back(key);
            }
        }

        self.pending = kept;
        taken
    }

    /// Records a finished fetch
    pub fn mark_visited(&mut self, url: &Url, success: bool) {
        let key = url.as_str();
        if !self.discovered.contains_key(key) {
            debug!("Ignoring visit of undiscovered URL {}", key);
            return;
        }
        if self.pending_set.remove(key) {
            self.pending.retain(|k| k != key);
        }
        self.visited.insert(key.to_string(), success);
    }

    /// Drops a pending URL without fetching it; it stays discovered
    pub fn abandon(&mut self, url: &Url) -> bool {
        let key = url.as_str();
        if !self.pending_set.remove(key) {
            return false;
        }
        self.pending.retain(|k| k != key);
        true
    }

    pub fn get(&self, url: &Url) -> Option<&CrawlTarget> {
        self.discovered.get(url.as_str())
    }

    pub fn is_discovered(&self, url: &Url) -> bool {
        self.discovered.contains_key(url.as_str())
    }

    pub fn is_pending(&self, url: &Url) -> bool {
        self.pending_set.contains(url.as_str())
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains_key(url.as_str())
    }

    /// Visited targets in `category` whose fetch succeeded, in discovery order
    pub fn visited_successfully(&self, category: UrlCategory) -> Vec<CrawlTarget> {
        self.order
            .iter()
            .filter(|key| self.visited.get(*key) == Some(&true))
            .filter_map(|key| self.discovered.get(key))
            .filter(|t| t.category == category)
            .cloned()
            .collect()
    }

    pub fn discovered_count(&self) -> usize {
        self.discovered.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Fetches left before the page budget is spent
    pub fn remaining_budget(&self) -> usize {
        self.max_pages.saturating_sub(self.visited.len())
    }

    /// True once nothing is pending or the page budget is spent
    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty() || self.remaining_budget() == 0
    }

    /// Discovered URL counts per bucket
    pub fn category_counts(&self) -> HashMap<UrlCategory, usize> {
        UrlCategory::ALL
            .iter()
            .map(|c| (*c, self.counts.get(c).copied().unwrap_or(0)))
            .collect()
    }

    /// Every discovered URL in discovery order
    pub fn discovered_urls(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut CrawlStats {
        &mut self.stats
    }
}
