use rand::seq::SliceRandom;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, UPGRADE_INSECURE_REQUESTS,
    USER_AGENT,
};

/// (user agent, client-hint platform, mobile)
const USER_AGENTS: &[(&str, &str, bool)] = &[
    (
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
        "Windows",
        false,
    ),
    (
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
        "macOS",
        false,
    ),
    (
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
        "Linux",
        false,
    ),
    (
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36 Edg/130.0.0.0",
        "Windows",
        false,
    ),
    (
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Safari/605.1.15",
        "macOS",
        false,
    ),
    (
        "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Mobile Safari/537.36",
        "Android",
        true,
    ),
];

const DESKTOP_VIEWPORTS: &[(u32, u32)] = &[
    (1920, 1080),
    (1536, 864),
    (1440, 900),
    (1366, 768),
    (1280, 800),
    (2560, 1440),
];

const MOBILE_VIEWPORTS: &[(u32, u32)] = &[(412, 915), (393, 873), (360, 800)];

const ACCEPT_LANGUAGES: &[&str] = &[
    "en-US,en;q=0.9",
    "en-GB,en;q=0.9",
    "en-US,en;q=0.8,de;q=0.6",
    "en-CA,en;q=0.9,fr-CA;q=0.7",
];

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Browser identity presented by one fetch session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub user_agent: &'static str,
    pub platform: &'static str,
    pub mobile: bool,
    pub viewport: (u32, u32),
    pub accept_language: &'static str,
}

impl Fingerprint {
    /// Draws a consistent fingerprint from the fixed pools
    ///
    /// Viewport and platform always agree with the chosen user agent.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();

        let (user_agent, platform, mobile) =
            *USER_AGENTS.choose(&mut rng).unwrap_or(&USER_AGENTS[0]);
        let viewports = if mobile {
            MOBILE_VIEWPORTS
        } else {
            DESKTOP_VIEWPORTS
        };

        Self {
            user_agent,
            platform,
            mobile,
            viewport: *viewports.choose(&mut rng).unwrap_or(&viewports[0]),
            accept_language: ACCEPT_LANGUAGES
                .choose(&mut rng)
                .copied()
                .unwrap_or(ACCEPT_LANGUAGES[0]),
        }
    }

    /// The header set a real browser with this identity sends on navigation
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(self.user_agent));
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(self.accept_language),
        );
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

        let pairs: [(&'static str, &'static str); 5] = [
            ("sec-fetch-dest", "document"),
            ("sec-fetch-mode", "navigate"),
            ("sec-fetch-site", "none"),
            ("sec-fetch-user", "?1"),
            ("sec-ch-ua-mobile", if self.mobile { "?1" } else { "?0" }),
        ];
        for (name, value) in pairs {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }

        if let Ok(platform) = HeaderValue::from_str(&format!("\"{}\"", self.platform)) {
            headers.insert(HeaderName::from_static("sec-ch-ua-platform"), platform);
        }
        if let Ok(width) = HeaderValue::from_str(&self.viewport.0.to_string()) {
            headers.insert(HeaderName::from_static("viewport-width"), width);
        }

        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_fingerprint_is_consistent() {
        for _ in 0..50 {
            let fp = Fingerprint::random();
            let pool = if fp.mobile {
                MOBILE_VIEWPORTS
            } else {
                DESKTOP_VIEWPORTS
            };
            assert!(pool.contains(&fp.viewport));
            assert!(USER_AGENTS
                .iter()
                .any(|(ua, platform, _)| *ua == fp.user_agent && *platform == fp.platform));
        }
    }

    #[test]
    fn test_headers() {
        let fp = Fingerprint {
            user_agent: USER_AGENTS[1].0,
            platform: "macOS",
            mobile: false,
            viewport: (1440, 900),
            accept_language: "en-GB,en;q=0.9",
        };
        let headers = fp.headers();
        assert_eq!(headers[USER_AGENT], USER_AGENTS[1].0);
        assert_eq!(headers[ACCEPT_LANGUAGE], "en-GB,en;q=0.9");
        assert_eq!(headers["sec-ch-ua-platform"], "\"macOS\"");
        assert_eq!(headers["sec-ch-ua-mobile"], "?0");
        assert_eq!(headers["viewport-width"], "1440");
    }
}
