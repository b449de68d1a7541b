use crate::config::FilterConfig;
use crate::robots::ParsedRobots;
use crate::url::domain::{extract_domain, is_same_site, matches_wildcard};
use crate::url::normalize::normalize_url;
use crate::{ConfigError, UrlError};
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// Why a URL was refused admission to the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Could not be parsed or normalized
    Invalid(UrlError),
    /// Outside the seed's site and not in the allowed domains
    OffDomain,
    /// Matched one of the exclude patterns
    Excluded,
    /// Points at a binary or asset file
    Extension,
    /// Disallowed by robots.txt
    Robots,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(e) => write!(f, "invalid: {}", e),
            Self::OffDomain => write!(f, "off-domain"),
            Self::Excluded => write!(f, "excluded by pattern"),
            Self::Extension => write!(f, "excluded extension"),
            Self::Robots => write!(f, "disallowed by robots.txt"),
        }
    }
}

/// Admission policy applied to every URL before it reaches the frontier
///
/// Checks, in order: normalization, domain scope, file extension, exclude
/// patterns and robots.txt rules.
#[derive(Debug, Clone)]
pub struct UrlPolicy {
    seed: Url,
    follow_external: bool,
    allowed_domains: Vec<String>,
    exclude: Vec<Regex>,
    excluded_extensions: HashSet<String>,
    robots: Option<(ParsedRobots, String)>,
}

impl UrlPolicy {
    /// Builds a policy scoped to the seed's site
    ///
    /// # Arguments
    ///
    /// * `seed` - The normalized seed URL
    /// * `filters` - Exclude patterns, extensions and extra domains
    /// * `follow_external` - Admit URLs on any host
    ///
    /// # Returns
    ///
    /// * `Ok(UrlPolicy)` - Ready to admit URLs
    /// * `Err(ConfigError)` - An exclude pattern is not a valid regex
    pub fn new(
        seed: Url,
        filters: &FilterConfig,
        follow_external: bool,
    ) -> Result<Self, ConfigError> {
        let exclude = filters
            .exclude_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    ConfigError::InvalidPattern(format!("Invalid exclude pattern '{}': {}", p, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            seed,
            follow_external,
            allowed_domains: filters
                .allowed_domains
                .iter()
                .map(|d| d.to_lowercase())
                .collect(),
            exclude,
            excluded_extensions: filters
                .excluded_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            robots: None,
        })
    }

    /// Installs robots.txt rules checked for the given agent token
    pub fn set_robots(&mut self, robots: ParsedRobots, agent: &str) {
        self.robots = Some((robots, agent.to_string()));
    }

    pub fn seed(&self) -> &Url {
        &self.seed
    }

    /// Normalizes `raw` and checks it against the policy
    pub fn admit(&self, raw: &str) -> Result<Url, Rejection> {
        let url = normalize_url(raw).map_err(Rejection::Invalid)?;

        if !self.in_scope(&url) {
            return Err(Rejection::OffDomain);
        }

        if self.has_excluded_extension(&url) {
            return Err(Rejection::Extension);
        }

        if self.exclude.iter().any(|re| re.is_match(url.as_str())) {
            return Err(Rejection::Excluded);
        }

        if let Some((robots, agent)) = &self.robots {
            if is_same_site(&self.seed, &url) && !robots.is_allowed(url.as_str(), agent) {
                return Err(Rejection::Robots);
            }
        }

        Ok(url)
    }

    fn in_scope(&self, url: &Url) -> bool {
        if self.follow_external || is_same_site(&self.seed, url) {
            return true;
        }

        match extract_domain(url) {
            Some(host) => self
                .allowed_domains
                .iter()
                .any(|pattern| matches_wildcard(pattern, &host)),
            None => false,
        }
    }

    fn has_excluded_extension(&self, url: &Url) -> bool {
        let last = url.path().rsplit('/').next().unwrap_or("");
        match last.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => {
                self.excluded_extensions.contains(&ext.to_lowercase())
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_policy() -> UrlPolicy {
        let seed = Url::parse("https://www.shop.test/").unwrap();
        UrlPolicy::new(seed, &FilterConfig::default(), false).unwrap()
    }

    #[test]
    fn test_admits_and_normalizes() {
        let policy = create_test_policy();
        let url = policy
            .admit("https://www.shop.test/collections/shoes/?utm_source=x")
            .unwrap();
        assert_eq!(url.as_str(), "https://www.shop.test/collections/shoes");
    }

    #[test]
    fn test_rejects_invalid() {
        let policy = create_test_policy();
        assert!(matches!(policy.admit("::nope"), Err(Rejection::Invalid(_))));
        assert!(matches!(
            policy.admit("mailto:a@shop.test"),
            Err(Rejection::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_off_domain() {
        let policy = create_test_policy();
        assert_eq!(
            policy.admit("https://elsewhere.test/page"),
            Err(Rejection::OffDomain)
        );
        assert!(policy.admit("https://shop.test/page").is_ok());
        assert!(policy.admit("https://cdn.shop.test/page").is_ok());
    }

    #[test]
    fn test_allowed_domains_extend_scope() {
        let mut filters = FilterConfig::default();
        filters.allowed_domains = vec!["*.partner.test".to_string()];
        let seed = Url::parse("https://shop.test/").unwrap();
        let policy = UrlPolicy::new(seed, &filters, false).unwrap();

        assert!(policy.admit("https://eu.partner.test/x").is_ok());
        assert_eq!(
            policy.admit("https://other.test/x"),
            Err(Rejection::OffDomain)
        );
    }

    #[test]
    fn test_follow_external() {
        let seed = Url::parse("https://shop.test/").unwrap();
        let policy = UrlPolicy::new(seed, &FilterConfig::default(), true).unwrap();
        assert!(policy.admit("https://elsewhere.test/page").is_ok());
    }

    #[test]
    fn test_rejects_excluded_extension() {
        let policy = create_test_policy();
        assert_eq!(
            policy.admit("https://shop.test/files/manual.PDF"),
            Err(Rejection::Extension)
        );
        assert!(policy.admit("https://shop.test/item-123.html").is_ok());
    }

    #[test]
    fn test_rejects_exclude_pattern() {
        let policy = create_test_policy();
        assert_eq!(
            policy.admit("https://shop.test/cart"),
            Err(Rejection::Excluded)
        );
        assert_eq!(
            policy.admit("https://shop.test/account/orders"),
            Err(Rejection::Excluded)
        );
        assert!(policy.admit("https://shop.test/cartoons").is_ok());
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let mut filters = FilterConfig::default();
        filters.exclude_patterns = vec!["[".to_string()];
        let seed = Url::parse("https://shop.test/").unwrap();
        assert!(matches!(
            UrlPolicy::new(seed, &filters, false),
            Err(ConfigError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_robots_rules() {
        let mut policy = create_test_policy();
        policy.set_robots(
            ParsedRobots::from_content("User-agent: *\nDisallow: /private"),
            "deepsweep",
        );
        assert_eq!(
            policy.admit("https://www.shop.test/private/x"),
            Err(Rejection::Robots)
        );
        assert!(policy.admit("https://www.shop.test/public").is_ok());
    }
}
