use crate::config::PaginationConfig;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use url::Url;

/// Ways a listing can express "page N"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaginationTemplate {
    /// `/listing/page/N`
    PathSegment,
    /// `?page=N`
    QueryPage,
    /// `?p=N`
    QueryP,
    /// `?offset=(N-1)*page_size`
    Offset,
}

/// One speculative next-page URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCandidate {
    pub url: Url,
    pub page: u32,
    /// The listing URL with its pagination marker removed
    pub series: String,
}

fn path_page_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.*?)/page/(\d+)/?$").unwrap())
}

/// Detects the pagination marker a URL already carries
///
/// Returns the template in use and the current page number.
pub fn detect_marker(url: &Url, page_size: u32) -> Option<(PaginationTemplate, u32)> {
    for (key, value) in url.query_pairs() {
        let Ok(n) = value.parse::<u32>() else {
            continue;
        };
        match key.as_ref() {
            "page" => return Some((PaginationTemplate::QueryPage, n.max(1))),
            "p" => return Some((PaginationTemplate::QueryP, n.max(1))),
            "offset" if page_size > 0 => {
                return Some((PaginationTemplate::Offset, n / page_size + 1))
            }
            _ => {}
        }
    }

    path_page_regex()
        .captures(url.path())
        .and_then(|caps| caps.get(2))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(|n| (PaginationTemplate::PathSegment, n.max(1)))
}

/// Returns `url` with every pagination marker removed
///
/// Two pages of the same listing share one series key.
pub fn series_key(url: &Url) -> String {
    let mut base = url.clone();

    if let Some(caps) = path_page_regex().captures(url.path()) {
        let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        base.set_path(if prefix.is_empty() { "/" } else { prefix });
    }

    set_query_param(&mut base, &["page", "p", "offset"], None);
    base.to_string()
}

/// Rewrites the query, dropping `remove` keys and optionally appending a pair
fn set_query_param(url: &mut Url, remove: &[&str], add: Option<(&str, String)>) {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !remove.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if let Some((key, value)) = add {
        pairs.push((key.to_string(), value));
    }

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        url.query_pairs_mut().clear().extend_pairs(pairs.iter());
    }
}

/// Generates bounded next-page candidates for listing URLs
#[derive(Debug, Clone)]
pub struct PaginationSynthesizer {
    max_pages: u32,
    page_size: u32,
    templates: Vec<PaginationTemplate>,
}

impl PaginationSynthesizer {
    pub fn new(config: &PaginationConfig) -> Self {
        Self {
            max_pages: config.max_pages,
            page_size: config.page_size,
            templates: config.templates.clone(),
        }
    }

    /// Produces candidate URLs for the pages after `listing`
    ///
    /// A URL that already carries a marker is continued with that template
    /// from the next page up to the bound. A bare listing gets pages
    /// `2..=max_pages` from every configured template. Candidates are not
    /// checked for existence.
    pub fn synthesize(&self, listing: &Url) -> Vec<PageCandidate> {
        let series = series_key(listing);

        let (templates, first) = match detect_marker(listing, self.page_size) {
            Some((template, current)) => (vec![template], current.saturating_add(1)),
            None => (self.templates.clone(), 2),
        };

        let Ok(base) = Url::parse(&series) else {
            return Vec::new();
        };

        let mut candidates = Vec::new();
        for template in templates {
            for page in first..=self.max_pages {
                candidates.push(PageCandidate {
                    url: self.apply(&base, template, page),
                    page,
                    series: series.clone(),
                });
            }
        }
        candidates
    }

    fn apply(&self, base: &Url, template: PaginationTemplate, page: u32) -> Url {
        let mut url = base.clone();
        match template {
            PaginationTemplate::PathSegment => {
                let path = url.path().trim_end_matches('/').to_string();
                url.set_path(&format!("{}/page/{}", path, page));
            }
            PaginationTemplate::QueryPage => {
                set_query_param(&mut url, &["page"], Some(("page", page.to_string())));
            }
            PaginationTemplate::QueryP => {
                set_query_param(&mut url, &["p"], Some(("p", page.to_string())));
            }
            PaginationTemplate::Offset => {
                let offset = (page - 1).saturating_mul(self.page_size);
                set_query_param(&mut url, &["offset"], Some(("offset", offset.to_string())));
            }
        }
        url
    }
}
