//! Headless Chrome sessions over the DevTools protocol
//!
//! Every session gets its own browser context, so cookies and storage never
//! leak between sessions. Requests the page issues are recorded from the
//! moment the tab opens and reported as observed sub-resources.

use crate::fetch::{Browser, BrowserSession, FetchError, Fingerprint, Navigation};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as Chrome, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EventRequestWillBeSent, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};
use url::Url;

/// Status of the current document, from the navigation timing entry
const STATUS_JS: &str = "(() => { \
    const nav = performance.getEntriesByType('navigation')[0]; \
    return nav && nav.responseStatus ? nav.responseStatus : 200; \
})()";

/// Clicks the first visible "load more" style control
const LOAD_MORE_JS: &str = r#"(() => {
    const label = /(load|show|view|see)\s+more|more\s+(products|results|items)/i;
    const controls = Array.from(document.querySelectorAll('button, a, [role="button"]'));
    const target = controls.find(el =>
        el.offsetParent !== null && label.test((el.innerText || el.textContent || '').trim()));
    if (!target) return false;
    target.scrollIntoView({ block: 'center' });
    target.click();
    return true;
})()"#;

fn session_error(e: impl std::fmt::Display) -> FetchError {
    FetchError::Session(e.to_string())
}

/// `navigator.platform` value matching a fingerprint's client-hint platform
fn navigator_platform(platform: &str) -> &'static str {
    match platform {
        "Windows" => "Win32",
        "macOS" => "MacIntel",
        "Android" => "Linux armv8l",
        _ => "Linux x86_64",
    }
}

/// Recorded request URLs as sub-resources of `document`
///
/// Keeps http(s) URLs only, drops the document itself and repeats, and
/// preserves request order.
fn subresource_urls(requests: &[String], document: Option<&Url>) -> Vec<Url> {
    let mut seen = HashSet::new();
    requests
        .iter()
        .filter_map(|raw| Url::parse(raw).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .filter(|url| Some(url) != document)
        .filter(|url| seen.insert(url.to_string()))
        .collect()
}

/// A launched Chrome or Chromium process
///
/// Dropping it stops the DevTools event loop and kills the process.
pub struct ChromeBrowser {
    browser: Arc<Chrome>,
    handler: JoinHandle<()>,
}

impl ChromeBrowser {
    /// Launches Chrome with automation markers switched off
    ///
    /// # Arguments
    ///
    /// * `chrome_path` - Executable to run; auto-detected when `None`
    /// * `headless` - Run without a window
    ///
    /// # Returns
    ///
    /// * `Ok(ChromeBrowser)` - Process is up and accepting sessions
    /// * `Err(FetchError::Session)` - No executable, or the launch failed
    pub async fn launch(chrome_path: Option<&str>, headless: bool) -> Result<Self, FetchError> {
        let mut builder = BrowserConfig::builder()
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-notifications")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--mute-audio");

        if let Some(path) = chrome_path {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(FetchError::Session(format!(
                    "Chrome executable not found at {}",
                    path.display()
                )));
            }
            builder = builder.chrome_executable(path);
        }
        if !headless {
            builder = builder.with_head();
        }

        let config = builder.build().map_err(FetchError::Session)?;
        let (browser, mut handler) = Chrome::launch(config)
            .await
            .map_err(|e| FetchError::Session(format!("failed to launch Chrome: {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    trace!("DevTools handler: {}", e);
                }
            }
            debug!("DevTools handler finished");
        });

        info!("Launched Chrome (headless: {})", headless);
        Ok(Self {
            browser: Arc::new(browser),
            handler,
        })
    }

    async fn dispose_context(&self, context: BrowserContextId) {
        if let Err(e) = self
            .browser
            .execute(DisposeBrowserContextParams::new(context))
            .await
        {
            debug!("Failed to dispose browser context: {}", e);
        }
    }

    /// Opens a blank tab in `context` presenting `fingerprint`
    async fn open_page(
        &self,
        context: BrowserContextId,
        fingerprint: &Fingerprint,
    ) -> Result<Page, FetchError> {
        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context)
            .build()
            .map_err(FetchError::Session)?;
        let page = self.browser.new_page(target).await.map_err(session_error)?;

        page.execute(SetUserAgentOverrideParams {
            user_agent: fingerprint.user_agent.to_string(),
            accept_language: Some(fingerprint.accept_language.to_string()),
            platform: Some(navigator_platform(fingerprint.platform).to_string()),
            user_agent_metadata: None,
        })
        .await
        .map_err(session_error)?;

        let (width, height) = fingerprint.viewport;
        page.execute(
            SetDeviceMetricsOverrideParams::builder()
                .width(i64::from(width))
                .height(i64::from(height))
                .device_scale_factor(1.0)
                .mobile(fingerprint.mobile)
                .build()
                .map_err(FetchError::Session)?,
        )
        .await
        .map_err(session_error)?;

        Ok(page)
    }
}

impl Drop for ChromeBrowser {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait]
impl Browser for ChromeBrowser {
    async fn open_session(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Box<dyn BrowserSession>, FetchError> {
        let context = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(session_error)?
            .result
            .browser_context_id;

        let page = match self.open_page(context.clone(), fingerprint).await {
            Ok(page) => page,
            Err(e) => {
                self.dispose_context(context).await;
                return Err(e);
            }
        };

        let mut requests = match page.event_listener::<EventRequestWillBeSent>().await {
            Ok(stream) => stream,
            Err(e) => {
                let _ = page.close().await;
                self.dispose_context(context).await;
                return Err(session_error(e));
            }
        };
        let observed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&observed);
        let listener = tokio::spawn(async move {
            while let Some(event) = requests.next().await {
                if let Ok(mut urls) = sink.lock() {
                    urls.push(event.request.url.clone());
                }
            }
        });

        Ok(Box::new(ChromeSession {
            browser: Arc::clone(&self.browser),
            context: Some(context),
            page: Some(page),
            listener,
            observed,
            requested: None,
            document: None,
        }))
    }
}

struct ChromeSession {
    browser: Arc<Chrome>,
    context: Option<BrowserContextId>,
    page: Option<Page>,
    listener: JoinHandle<()>,
    observed: Arc<Mutex<Vec<String>>>,
    requested: Option<Url>,
    document: Option<Url>,
}

impl ChromeSession {
    fn page(&self) -> Result<&Page, FetchError> {
        self.page
            .as_ref()
            .ok_or_else(|| FetchError::Session("session already closed".to_string()))
    }

    async fn load(&mut self, url: &Url) -> Result<Navigation, FetchError> {
        if let Ok(mut urls) = self.observed.lock() {
            urls.clear();
        }

        let page = self.page()?;
        page.goto(url.as_str())
            .await
            .map_err(|e| FetchError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .and_then(|u| Url::parse(&u).ok())
            .unwrap_or_else(|| url.clone());
        let status = match page.evaluate(STATUS_JS).await {
            Ok(result) => result.into_value::<u16>().unwrap_or(200),
            Err(_) => 200,
        };

        self.requested = Some(url.clone());
        self.document = Some(final_url.clone());
        Ok(Navigation { final_url, status })
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &Url) -> Result<Navigation, FetchError> {
        self.load(url).await
    }

    async fn reload(&mut self) -> Result<Navigation, FetchError> {
        let url = self
            .requested
            .clone()
            .ok_or_else(|| FetchError::Session("nothing to reload".to_string()))?;
        self.load(&url).await
    }

    async fn scroll_by(&mut self, dy: i32) -> Result<(), FetchError> {
        self.page()?
            .evaluate(format!("window.scrollBy(0, {dy})"))
            .await
            .map_err(session_error)?;
        Ok(())
    }

    async fn move_mouse(&mut self, x: u32, y: u32) -> Result<(), FetchError> {
        self.page()?
            .execute(DispatchMouseEventParams::new(
                DispatchMouseEventType::MouseMoved,
                f64::from(x),
                f64::from(y),
            ))
            .await
            .map_err(session_error)?;
        Ok(())
    }

    async fn click_load_more(&mut self) -> Result<bool, FetchError> {
        let result = self
            .page()?
            .evaluate(LOAD_MORE_JS)
            .await
            .map_err(session_error)?;
        Ok(result.into_value::<bool>().unwrap_or(false))
    }

    async fn content(&self) -> Result<String, FetchError> {
        self.page()?.content().await.map_err(session_error)
    }

    fn observed_subresources(&self) -> Vec<Url> {
        match self.observed.lock() {
            Ok(requests) => subresource_urls(&requests, self.document.as_ref()),
            Err(_) => Vec::new(),
        }
    }

    async fn close(&mut self) {
        self.listener.abort();
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("Failed to close tab: {}", e);
            }
        }
        if let Some(context) = self.context.take() {
            if let Err(e) = self
                .browser
                .execute(DisposeBrowserContextParams::new(context))
                .await
            {
                debug!("Failed to dispose browser context: {}", e);
            }
        }
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.listener.abort();
        let Some(page) = self.page.take() else {
            return;
        };
        debug!("Chrome session dropped without close; releasing");

        let context = self.context.take();
        let browser = Arc::clone(&self.browser);
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                let _ = page.close().await;
                if let Some(context) = context {
                    let _ = browser
                        .execute(DisposeBrowserContextParams::new(context))
                        .await;
                }
            });
        }
    }
}
