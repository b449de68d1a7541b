//! Anti-detection fetch layer
//!
//! Each page fetch runs as a sequence of full attempts. One attempt opens a
//! fresh browser session under a random fingerprint and walks:
//!
//! ```text
//! NAVIGATE -> BLOCK_CHECK -> (blocked? reload once : continue) -> HUMAN_SIM -> EXTRACT_HTML
//! ```
//!
//! | Condition | Action |
//! |-----------|--------|
//! | Block phrase or HTTP 429 | Reload once after a random delay, then fail the attempt |
//! | Navigation timeout | Fail the attempt |
//! | Connection error / HTTP 5xx | Fail the attempt |
//! | HTTP 404 / other 4xx | Permanent failure, no further attempts |
//! | Simulation error | Ignored |
//!
//! Failed attempts are retried with exponential backoff up to the configured
//! bound. Requests are paced globally through a [`Pacer`]. The session is
//! closed on every exit path.

mod chrome;
mod detect;
mod fingerprint;
mod human;
mod pacing;
mod session;

pub use chrome::ChromeBrowser;
pub use detect::{detect_block, BLOCK_PHRASES};
pub use fingerprint::Fingerprint;
pub use pacing::{backoff_delay, random_between, Pacer};
pub use session::{Browser, BrowserSession, HttpBrowser, Navigation};

use crate::config::{BrowserKind, FetchConfig};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Errors from a single fetch attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("navigation to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Http { url: String, status: u16 },

    #[error("{url} is blocked ({signal})")]
    Blocked { url: String, signal: String },

    #[error("browser session error: {0}")]
    Session(String),
}

impl FetchError {
    /// Whether another full attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Navigation { .. } | Self::Blocked { .. } => true,
            Self::Http { status, .. } => *status >= 500 || *status == 408,
            Self::Session(_) => false,
        }
    }
}

/// Outcome class of a page fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Success,
    Blocked,
    Error,
}

/// How much interaction a page view gets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// A few scrolls
    Standard,
    /// Long scrolling with "load more" clicks, used for dynamic discovery
    Exhaustive,
}

/// Result of fetching one page
#[derive(Debug, Clone)]
pub struct PageFetchResult {
    pub url: Url,
    /// URL after redirects
    pub final_url: Url,
    pub html: String,
    pub blocked: bool,
    /// Attempts made beyond the first
    pub retry_count: u32,
    pub status: FetchStatus,
    pub http_status: Option<u16>,
    /// Sub-resource URLs observed while the page was open
    pub subresources: Vec<Url>,
    pub error: Option<FetchError>,
}

impl PageFetchResult {
    pub fn is_success(&self) -> bool {
        self.status == FetchStatus::Success
    }

    fn failed(url: &Url, error: FetchError, retry_count: u32) -> Self {
        let (status, blocked) = match error {
            FetchError::Blocked { .. } => (FetchStatus::Blocked, true),
            _ => (FetchStatus::Error, false),
        };
        let http_status = match error {
            FetchError::Http { status, .. } => Some(status),
            _ => None,
        };
        Self {
            url: url.clone(),
            final_url: url.clone(),
            html: String::new(),
            blocked,
            retry_count,
            status,
            http_status,
            subresources: Vec::new(),
            error: Some(error),
        }
    }
}

/// What a successful attempt produced
struct Loaded {
    final_url: Url,
    status: u16,
    html: String,
    subresources: Vec<Url>,
}

/// Fetches pages through a [`Browser`] with blocking detection and retries
#[derive(Clone)]
pub struct FetchLayer {
    browser: Arc<dyn Browser>,
    config: FetchConfig,
    pacer: Arc<Pacer>,
}

impl FetchLayer {
    /// Creates a fetch layer over any browser implementation
    ///
    /// # Arguments
    ///
    /// * `browser` - Session factory
    /// * `config` - Retry, timeout, pacing and simulation settings
    /// * `base_delay_ms` - Starting inter-request delay
    pub fn new(browser: Arc<dyn Browser>, config: FetchConfig, base_delay_ms: u64) -> Self {
        let pacer = Arc::new(Pacer::new(base_delay_ms, &config));
        Self {
            browser,
            config,
            pacer,
        }
    }

    /// Creates a fetch layer backed by plain HTTP sessions
    pub fn http(config: FetchConfig, base_delay_ms: u64) -> Self {
        let browser = HttpBrowser::new(Duration::from_millis(config.navigation_timeout_ms));
        Self::new(Arc::new(browser), config, base_delay_ms)
    }

    /// Creates a fetch layer over the browser selected in `config`
    ///
    /// Launching Chrome can fail; plain HTTP never does.
    pub async fn launch(config: FetchConfig, base_delay_ms: u64) -> Result<Self, FetchError> {
        match config.browser {
            BrowserKind::Http => Ok(Self::http(config, base_delay_ms)),
            BrowserKind::Chrome => {
                let browser =
                    ChromeBrowser::launch(config.chrome_path.as_deref(), config.headless).await?;
                Ok(Self::new(Arc::new(browser), config, base_delay_ms))
            }
        }
    }

    /// Raises the minimum inter-request delay (robots.txt Crawl-delay)
    pub fn set_min_delay(&self, ms: u64) {
        self.pacer.set_min_delay(ms);
    }

    pub fn requests_made(&self) -> u64 {
        self.pacer.requests()
    }

    /// Fetches `url`, retrying failed attempts with backoff
    ///
    /// Never returns an error: failures are described by the result's
    /// `status` and `error` fields.
    pub async fn fetch(&self, url: &Url, interaction: Interaction) -> PageFetchResult {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            if attempt > 1 {
                let wait = backoff_delay(
                    attempt - 1,
                    self.config.backoff_base_ms,
                    self.config.backoff_max_ms,
                );
                debug!("Retrying {} in {:?} (attempt {})", url, wait, attempt);
                tokio::time::sleep(wait).await;
            }

            self.pacer.wait().await;

            match self.attempt(url, interaction).await {
                Ok(loaded) => {
                    return PageFetchResult {
                        url: url.clone(),
                        final_url: loaded.final_url,
                        html: loaded.html,
                        blocked: false,
                        retry_count: attempt - 1,
                        status: FetchStatus::Success,
                        http_status: Some(loaded.status),
                        subresources: loaded.subresources,
                        error: None,
                    };
                }
                Err(e) => {
                    if !e.is_retryable() || attempt >= max_attempts {
                        warn!("Fetch failed for {} after {} attempt(s): {}", url, attempt, e);
                        return PageFetchResult::failed(url, e, attempt - 1);
                    }
                    debug!("Attempt {} for {} failed: {}", attempt, url, e);
                }
            }
        }
    }

    /// One full attempt in its own session; the session is always closed
    async fn attempt(&self, url: &Url, interaction: Interaction) -> Result<Loaded, FetchError> {
        let fingerprint = Fingerprint::random();
        let mut session = self.browser.open_session(&fingerprint).await?;

        let result = self
            .drive(session.as_mut(), url, interaction, fingerprint.viewport)
            .await;

        session.close().await;
        result
    }

    async fn drive(
        &self,
        session: &mut dyn BrowserSession,
        url: &Url,
        interaction: Interaction,
        viewport: (u32, u32),
    ) -> Result<Loaded, FetchError> {
        // NAVIGATE
        let mut nav = self.navigate(session, url, false).await?;
        let html = session.content().await?;

        // BLOCK_CHECK
        if let Some(signal) = detect_block(nav.status, &html) {
            let wait = random_between(
                self.config.block_reload_min_ms,
                self.config.block_reload_max_ms,
            );
            debug!("Block signal '{}' on {}; reloading in {:?}", signal, url, wait);
            tokio::time::sleep(wait).await;

            nav = self.navigate(session, url, true).await?;
            let html = session.content().await?;
            if let Some(signal) = detect_block(nav.status, &html) {
                return Err(FetchError::Blocked {
                    url: url.to_string(),
                    signal,
                });
            }
        }

        if nav.status >= 400 {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: nav.status,
            });
        }

        // HUMAN_SIM
        if self.config.human_simulation || interaction == Interaction::Exhaustive {
            if let Err(e) = human::simulate(session, &self.config, interaction, viewport).await {
                debug!("Ignoring interaction failure on {}: {}", url, e);
            }
        }

        // EXTRACT_HTML
        let html = session.content().await?;
        Ok(Loaded {
            final_url: nav.final_url,
            status: nav.status,
            html,
            subresources: session.observed_subresources(),
        })
    }

    async fn navigate(
        &self,
        session: &mut dyn BrowserSession,
        url: &Url,
        reload: bool,
    ) -> Result<Navigation, FetchError> {
        let timeout = Duration::from_millis(self.config.navigation_timeout_ms);
        let navigation = async {
            if reload {
                session.reload().await
            } else {
                session.navigate(url).await
            }
        };

        tokio::time::timeout(timeout, navigation)
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: self.config.navigation_timeout_ms,
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted page responses: (status, html) per navigation
    struct ScriptedBrowser {
        pages: Mutex<VecDeque<(u16, String)>>,
        opened: AtomicUsize,
        closed: Arc<AtomicUsize>,
        /// Time every navigation takes
        latency: Duration,
    }

    impl ScriptedBrowser {
        fn new(pages: Vec<(u16, &str)>) -> Arc<Self> {
            Self::slow(pages, Duration::ZERO)
        }

        fn slow(pages: Vec<(u16, &str)>, latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                pages: Mutex::new(pages.into_iter().map(|(s, h)| (s, h.to_string())).collect()),
                opened: AtomicUsize::new(0),
                closed: Arc::new(AtomicUsize::new(0)),
                latency,
            })
        }

        fn next_page(&self) -> (u16, String) {
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or((500, "exhausted".to_string()))
        }
    }

    struct ScriptedSession {
        browser: Arc<ScriptedBrowser>,
        html: String,
        closed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Browser for Arc<ScriptedBrowser> {
        async fn open_session(
            &self,
            _fingerprint: &Fingerprint,
        ) -> Result<Box<dyn BrowserSession>, FetchError> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(ScriptedSession {
                browser: Arc::clone(self),
                html: String::new(),
                closed: Arc::clone(&self.closed),
            }))
        }
    }

    #[async_trait]
    impl BrowserSession for ScriptedSession {
        async fn navigate(&mut self, url: &Url) -> Result<Navigation, FetchError> {
            tokio::time::sleep(self.browser.latency).await;
            let (status, html) = self.browser.next_page();
            self.html = html;
            Ok(Navigation {
                final_url: url.clone(),
                status,
            })
        }

        async fn reload(&mut self) -> Result<Navigation, FetchError> {
            let url = Url::parse("https://shop.test/").unwrap();
            self.navigate(&url).await
        }

        async fn scroll_by(&mut self, _dy: i32) -> Result<(), FetchError> {
            Err(FetchError::Session("scrolling unsupported".to_string()))
        }

        async fn move_mouse(&mut self, _x: u32, _y: u32) -> Result<(), FetchError> {
            Ok(())
        }

        async fn click_load_more(&mut self) -> Result<bool, FetchError> {
            Ok(false)
        }

        async fn content(&self) -> Result<String, FetchError> {
            Ok(self.html.clone())
        }

        fn observed_subresources(&self) -> Vec<Url> {
            Vec::new()
        }

        async fn close(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn create_test_config(max_attempts: u32) -> FetchConfig {
        FetchConfig {
            max_attempts,
            backoff_base_ms: 0,
            backoff_max_ms: 0,
            block_reload_min_ms: 0,
            block_reload_max_ms: 0,
            human_pause_min_ms: 0,
            human_pause_max_ms: 0,
            ..Default::default()
        }
    }

    fn layer(browser: &Arc<ScriptedBrowser>, max_attempts: u32) -> FetchLayer {
        FetchLayer::new(Arc::new(Arc::clone(browser)), create_test_config(max_attempts), 0)
    }

    fn url() -> Url {
        Url::parse("https://shop.test/").unwrap()
    }

    #[tokio::test]
    async fn test_success_ignores_simulation_errors() {
        let browser = ScriptedBrowser::new(vec![(200, "<html>fine</html>")]);
        let result = layer(&browser, 3).fetch(&url(), Interaction::Standard).await;

        assert!(result.is_success());
        assert_eq!(result.html, "<html>fine</html>");
        assert_eq!(result.retry_count, 0);
        assert_eq!(result.http_status, Some(200));
        assert_eq!(browser.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_block_then_clear_on_reload() {
        let browser = ScriptedBrowser::new(vec![
            (200, "please solve the captcha"),
            (200, "<html>products</html>"),
        ]);
        let result = layer(&browser, 1).fetch(&url(), Interaction::Standard).await;

        assert!(result.is_success());
        assert_eq!(result.html, "<html>products</html>");
        assert_eq!(browser.opened.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_still_blocked_after_reload() {
        let browser = ScriptedBrowser::new(vec![(200, "captcha"), (200, "captcha")]);
        let result = layer(&browser, 1).fetch(&url(), Interaction::Standard).await;

        assert_eq!(result.status, FetchStatus::Blocked);
        assert!(result.blocked);
        assert!(matches!(result.error, Some(FetchError::Blocked { .. })));
        assert_eq!(browser.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_errors_retry_until_bound() {
        let browser = ScriptedBrowser::new(vec![(503, "busy"), (502, "busy"), (200, "<p>ok</p>")]);
        let result = layer(&browser, 3).fetch(&url(), Interaction::Standard).await;

        assert!(result.is_success());
        assert_eq!(result.retry_count, 2);
        assert_eq!(browser.opened.load(Ordering::SeqCst), 3);
        assert_eq!(browser.closed.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_not_found_is_permanent() {
        let browser = ScriptedBrowser::new(vec![(404, "missing"), (200, "never")]);
        let result = layer(&browser, 3).fetch(&url(), Interaction::Standard).await;

        assert_eq!(result.status, FetchStatus::Error);
        assert_eq!(result.http_status, Some(404));
        assert_eq!(browser.opened.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_navigation_timeout_is_retried_like_any_failure() {
        let browser = ScriptedBrowser::slow(
            vec![(200, "late"), (200, "late"), (200, "late")],
            Duration::from_millis(500),
        );
        let config = FetchConfig {
            navigation_timeout_ms: 20,
            ..create_test_config(3)
        };
        let fetcher = FetchLayer::new(Arc::new(Arc::clone(&browser)), config, 0);

        let result = fetcher.fetch(&url(), Interaction::Standard).await;

        assert_eq!(result.status, FetchStatus::Error);
        assert!(matches!(
            result.error,
            Some(FetchError::Timeout { timeout_ms: 20, .. })
        ));
        assert_eq!(result.retry_count, 2);
        assert_eq!(browser.opened.load(Ordering::SeqCst), 3);
        assert_eq!(browser.closed.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_retryable_classification() {
        let http = |status| FetchError::Http {
            url: "u".to_string(),
            status,
        };
        assert!(http(500).is_retryable());
        assert!(http(408).is_retryable());
        assert!(!http(404).is_retryable());
        assert!(!http(410).is_retryable());
        assert!(!FetchError::Session("x".to_string()).is_retryable());
    }
}
