use crate::discovery::PaginationTemplate;
use serde::Deserialize;

/// Main configuration structure for Deepsweep
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed URL; the CLI flag overrides it
    pub seed: Option<String>,
    pub crawler: CrawlerConfig,
    pub fetch: FetchConfig,
    pub content: ContentConfig,
    pub pagination: PaginationConfig,
    pub filters: FilterConfig,
    pub sitemap: SitemapConfig,
    pub categorize: CategorizeConfig,
    pub output: OutputConfig,
}

/// Crawl budget and phase switches
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Maximum number of pages fetched in one run
    pub max_pages: usize,

    /// Maximum link depth from the seed
    pub max_depth: u32,

    /// Base delay between requests (milliseconds); pacing grows from here
    pub delay_ms: u64,

    /// Worker pool size for the category/pagination phase
    pub concurrency: usize,

    /// Worker pool size for the exhaustive phase
    pub bfs_concurrency: usize,

    pub enable_pagination: bool,
    pub enable_category_traversal: bool,
    pub enable_dynamic_discovery: bool,
    pub follow_external_links: bool,

    /// Honor robots.txt Allow/Disallow and Crawl-delay
    pub respect_robots: bool,

    /// Agent token used when matching robots.txt groups
    pub robots_agent: String,

    /// Number of category pages revisited during dynamic discovery
    pub dynamic_sample_size: usize,

    /// Emit a progress event every N fetched pages
    pub progress_interval: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 500,
            max_depth: 5,
            delay_ms: 1000,
            concurrency: 3,
            bfs_concurrency: 1,
            enable_pagination: true,
            enable_category_traversal: true,
            enable_dynamic_discovery: false,
            follow_external_links: false,
            respect_robots: true,
            robots_agent: "deepsweep".to_string(),
            dynamic_sample_size: 3,
            progress_interval: 10,
        }
    }
}

/// Anti-detection fetch layer tuning
///
/// Retry counts and backoff constants are empirically tuned, so all of them
/// live here instead of in code.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FetchConfig {
    /// Session backend for page fetches
    pub browser: BrowserKind,

    /// Chrome or Chromium executable; auto-detected when unset
    pub chrome_path: Option<String>,

    /// Run Chrome without a window
    pub headless: bool,

    /// Full attempts per page (navigate, block check, interaction)
    pub max_attempts: u32,

    /// Bound on a single navigation (milliseconds)
    pub navigation_timeout_ms: u64,

    /// First retry backoff; doubles on every further attempt
    pub backoff_base_ms: u64,

    /// Upper bound for a single retry backoff
    pub backoff_max_ms: u64,

    /// Randomized wait before reloading a blocked page
    pub block_reload_min_ms: u64,
    pub block_reload_max_ms: u64,

    /// Scroll/mouse simulation after navigation
    pub human_simulation: bool,
    pub human_pause_min_ms: u64,
    pub human_pause_max_ms: u64,

    /// Pacing growth per request already made
    pub pacing_request_growth: f64,

    /// Pacing growth per minute of session age
    pub pacing_age_growth: f64,

    /// Ceiling for the paced inter-request delay
    pub pacing_max_ms: u64,

    /// Random share added on top of the paced delay (0.0 - 1.0)
    pub pacing_jitter: f64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            browser: BrowserKind::Http,
            chrome_path: None,
            headless: true,
            max_attempts: 3,
            navigation_timeout_ms: 45_000,
            backoff_base_ms: 2_000,
            backoff_max_ms: 30_000,
            block_reload_min_ms: 5_000,
            block_reload_max_ms: 15_000,
            human_simulation: true,
            human_pause_min_ms: 150,
            human_pause_max_ms: 900,
            pacing_request_growth: 0.01,
            pacing_age_growth: 0.05,
            pacing_max_ms: 20_000,
            pacing_jitter: 0.3,
        }
    }
}

/// Which browser implementation drives fetch sessions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BrowserKind {
    /// Plain HTTP sessions; no script execution
    #[default]
    Http,
    /// Headless Chrome; renders scripts and performs real interaction
    Chrome,
}

/// Content extraction and chunking
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ContentConfig {
    /// Chunk window size in characters
    pub window_size: usize,

    /// Characters shared by consecutive windows
    pub overlap: usize,

    /// Windows shorter than this (trimmed) are dropped
    pub min_chunk_chars: usize,

    /// Container candidates below this length fall back to the whole body
    pub min_candidate_chars: usize,

    /// Extra main-content selectors, evaluated after the built-in ones
    pub extra_content_selectors: Vec<String>,

    /// Extra boilerplate selectors removed before extraction
    pub extra_remove_selectors: Vec<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            window_size: 2000,
            overlap: 200,
            min_chunk_chars: 100,
            min_candidate_chars: 200,
            extra_content_selectors: Vec::new(),
            extra_remove_selectors: Vec::new(),
        }
    }
}

/// Pagination synthesis
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PaginationConfig {
    /// Highest page number synthesized for a listing
    pub max_pages: u32,

    /// Items per page assumed by the offset template
    pub page_size: u32,

    /// Templates applied to listings that carry no pagination marker
    pub templates: Vec<PaginationTemplate>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            max_pages: 50,
            page_size: 24,
            templates: vec![PaginationTemplate::QueryPage],
        }
    }
}

/// URL admission policy
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FilterConfig {
    /// Regular expressions matched against the full normalized URL
    pub exclude_patterns: Vec<String>,

    /// File extensions (without dot) that are never crawled
    pub excluded_extensions: Vec<String>,

    /// Extra in-scope domains; supports "*.example.com" wildcards
    pub allowed_domains: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            exclude_patterns: vec![
                r"(?i)/(cart|basket|checkout|account|login|logout|register|signin|sign-in|signup|wishlist|compare)(/|\?|$)"
                    .to_string(),
                r"(?i)[?&](add-to-cart|add_to_cart|sort|orderby|filter)=".to_string(),
            ],
            excluded_extensions: [
                "pdf", "jpg", "jpeg", "png", "gif", "webp", "svg", "ico", "bmp", "css", "js",
                "json", "xml", "zip", "gz", "rar", "tar", "mp3", "mp4", "avi", "mov", "webm",
                "woff", "woff2", "ttf", "eot", "exe", "dmg",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            allowed_domains: Vec::new(),
        }
    }
}

/// Sitemap resolution
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SitemapConfig {
    pub enabled: bool,

    /// Bound on fetching robots.txt and each sitemap document
    pub timeout_ms: u64,

    /// How deep sitemap indexes may nest
    pub max_nesting: u32,

    /// Cap on leaf URLs collected from all sitemaps
    pub max_urls: usize,

    /// Additional site-relative sitemap locations to try
    pub extra_paths: Vec<String>,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 15_000,
            max_nesting: 3,
            max_urls: 50_000,
            extra_paths: Vec::new(),
        }
    }
}

/// Site-specific categorization patterns, added to the built-in ones
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CategorizeConfig {
    pub category_patterns: Vec<String>,
    pub pagination_patterns: Vec<String>,
    pub product_patterns: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Path of the JSON discovery report
    pub report_path: String,

    /// Path of the markdown summary
    pub summary_path: String,

    /// Directory receiving one JSON file per content document
    pub content_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: "./deepsweep-report.json".to_string(),
            summary_path: "./deepsweep-summary.md".to_string(),
            content_dir: "./deepsweep-content".to_string(),
        }
    }
}
