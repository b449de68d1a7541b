use crate::discovery::LinkExtractor;
use crate::fetch::{FetchError, Fingerprint};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Where a navigation ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub final_url: Url,
    pub status: u16,
}

/// Something that can open isolated browsing sessions
#[async_trait]
pub trait Browser: Send + Sync {
    /// Opens a fresh session presenting `fingerprint`
    ///
    /// Sessions share no cookies or storage with each other.
    async fn open_session(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Box<dyn BrowserSession>, FetchError>;
}

/// One isolated browsing context
///
/// Callers must call [`BrowserSession::close`] when done; implementations
/// also release their resources on drop so a cancelled fetch cannot leak.
#[async_trait]
pub trait BrowserSession: Send {
    async fn navigate(&mut self, url: &Url) -> Result<Navigation, FetchError>;

    async fn reload(&mut self) -> Result<Navigation, FetchError>;

    async fn scroll_by(&mut self, dy: i32) -> Result<(), FetchError>;

    async fn move_mouse(&mut self, x: u32, y: u32) -> Result<(), FetchError>;

    /// Clicks a "load more" control if the page has one
    ///
    /// Returns whether anything was clicked.
    async fn click_load_more(&mut self) -> Result<bool, FetchError>;

    /// Current document HTML
    async fn content(&self) -> Result<String, FetchError>;

    /// URLs the page requested or would request beyond the document itself
    fn observed_subresources(&self) -> Vec<Url>;

    async fn close(&mut self);
}

/// Plain HTTP implementation of [`Browser`]
///
/// Every session is its own `reqwest` client with a private cookie jar and the
/// fingerprint's headers. There is no script engine, so interaction is a no-op
/// and the observed sub-resources are the URLs the markup points its dynamic
/// widgets at.
#[derive(Debug, Clone)]
pub struct HttpBrowser {
    timeout: Duration,
    links: LinkExtractor,
}

impl HttpBrowser {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            links: LinkExtractor::new(),
        }
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn open_session(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Box<dyn BrowserSession>, FetchError> {
        let client = Client::builder()
            .default_headers(fingerprint.headers())
            .cookie_store(true)
            .timeout(self.timeout)
            .connect_timeout(self.timeout.min(Duration::from_secs(10)))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| FetchError::Session(e.to_string()))?;

        Ok(Box::new(HttpSession {
            client,
            links: self.links.clone(),
            timeout_ms: self.timeout.as_millis() as u64,
            page: None,
            closed: false,
        }))
    }
}

struct LoadedPage {
    requested: Url,
    final_url: Url,
    html: String,
}

struct HttpSession {
    client: Client,
    links: LinkExtractor,
    timeout_ms: u64,
    page: Option<LoadedPage>,
    closed: bool,
}

impl HttpSession {
    async fn load(&mut self, url: &Url) -> Result<Navigation, FetchError> {
        if self.closed {
            return Err(FetchError::Session("session already closed".to_string()));
        }

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_reqwest_error(url, e, self.timeout_ms))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(url, e, self.timeout_ms))?;

        self.page = Some(LoadedPage {
            requested: url.clone(),
            final_url: final_url.clone(),
            html,
        });

        Ok(Navigation { final_url, status })
    }
}

fn classify_reqwest_error(url: &Url, e: reqwest::Error, timeout_ms: u64) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            timeout_ms,
        }
    } else {
        FetchError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn navigate(&mut self, url: &Url) -> Result<Navigation, FetchError> {
        self.load(url).await
    }

    async fn reload(&mut self) -> Result<Navigation, FetchError> {
        let url = match &self.page {
            Some(page) => page.requested.clone(),
            None => return Err(FetchError::Session("nothing to reload".to_string())),
        };
        self.load(&url).await
    }

    async fn scroll_by(&mut self, _dy: i32) -> Result<(), FetchError> {
        Ok(())
    }

    async fn move_mouse(&mut self, _x: u32, _y: u32) -> Result<(), FetchError> {
        Ok(())
    }

    async fn click_load_more(&mut self) -> Result<bool, FetchError> {
        Ok(false)
    }

    async fn content(&self) -> Result<String, FetchError> {
        self.page
            .as_ref()
            .map(|page| page.html.clone())
            .ok_or_else(|| FetchError::Session("no page loaded".to_string()))
    }

    fn observed_subresources(&self) -> Vec<Url> {
        match &self.page {
            Some(page) => self.links.subresources(&page.html, &page.final_url),
            None => Vec::new(),
        }
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.page = None;
            debug!("Closed fetch session");
        }
    }
}

impl Drop for HttpSession {
    fn drop(&mut self) {
        if !self.closed {
            debug!("Fetch session dropped without close; releasing");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_session_navigates_and_reloads() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/listing"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body><div data-next-page="/listing?page=2"></div></body></html>"#,
            ))
            .expect(2)
            .mount(&server)
            .await;

        let browser = HttpBrowser::new(Duration::from_secs(5));
        let mut session = browser.open_session(&Fingerprint::random()).await.unwrap();
        let url = Url::parse(&format!("{}/listing", server.uri())).unwrap();

        let nav = session.navigate(&url).await.unwrap();
        assert_eq!(nav.status, 200);
        session.reload().await.unwrap();

        assert!(session.content().await.unwrap().contains("data-next-page"));
        let subresources = session.observed_subresources();
        assert_eq!(subresources.len(), 1);
        assert!(subresources[0].as_str().ends_with("/listing?page=2"));

        session.close().await;
        assert!(session.content().await.is_err());
        assert!(session.navigate(&url).await.is_err());
    }

    #[tokio::test]
    async fn test_reload_without_page_fails() {
        let browser = HttpBrowser::new(Duration::from_secs(5));
        let mut session = browser.open_session(&Fingerprint::random()).await.unwrap();
        assert!(matches!(
            session.reload().await,
            Err(FetchError::Session(_))
        ));
        session.close().await;
    }
}
