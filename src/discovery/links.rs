//! Role-tagged link extraction
//!
//! Links are harvested through a declarative table of selector groups, one
//! group per [`LinkRole`]. Groups are evaluated in table order and the first
//! role that yields a URL keeps it, so a link inside a breadcrumb is tagged
//! `Breadcrumb` even though the generic anchor group also matches it.

use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// The page region a link was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkRole {
    Breadcrumb,
    MegaMenu,
    Pagination,
    Navigation,
    Footer,
    Category,
    Product,
    Generic,
}

impl LinkRole {
    /// Site-structure links harvested first from the homepage
    pub fn is_strategic(&self) -> bool {
        matches!(
            self,
            Self::Breadcrumb | Self::MegaMenu | Self::Navigation | Self::Footer
        )
    }
}

/// Selector groups in precedence order
pub const LINK_SELECTOR_GROUPS: &[(LinkRole, &[&str])] = &[
    (
        LinkRole::Breadcrumb,
        &[
            "nav[aria-label='breadcrumb'] a[href]",
            "nav[aria-label='Breadcrumb'] a[href]",
            ".breadcrumb a[href]",
            ".breadcrumbs a[href]",
            "[class*='breadcrumb'] a[href]",
            "[itemtype*='BreadcrumbList'] a[href]",
        ],
    ),
    (
        LinkRole::MegaMenu,
        &[
            ".mega-menu a[href]",
            ".megamenu a[href]",
            "[class*='mega-menu'] a[href]",
            "[class*='megamenu'] a[href]",
            ".dropdown-menu a[href]",
            ".dropdown a[href]",
            ".submenu a[href]",
            ".sub-menu a[href]",
            "[role='menu'] a[href]",
        ],
    ),
    (
        LinkRole::Pagination,
        &[
            ".pagination a[href]",
            ".pager a[href]",
            "[class*='pagination'] a[href]",
            "nav[aria-label='pagination'] a[href]",
            "nav[aria-label='Pagination'] a[href]",
            "a[rel='next'][href]",
            "link[rel='next'][href]",
        ],
    ),
    (
        LinkRole::Navigation,
        &[
            "nav a[href]",
            "header a[href]",
            "[role='navigation'] a[href]",
            ".navbar a[href]",
            ".nav a[href]",
            ".menu a[href]",
        ],
    ),
    (
        LinkRole::Footer,
        &[
            "footer a[href]",
            ".footer a[href]",
            "[role='contentinfo'] a[href]",
        ],
    ),
    (
        LinkRole::Category,
        &[
            ".categories a[href]",
            ".category a[href]",
            ".category-list a[href]",
            ".collection a[href]",
            "[class*='category'] a[href]",
        ],
    ),
    (
        LinkRole::Product,
        &[
            ".product a[href]",
            ".product-item a[href]",
            ".product-card a[href]",
            ".product-tile a[href]",
            "[class*='product'] a[href]",
            "[itemtype*='Product'] a[href]",
            "[data-product-id] a[href]",
        ],
    ),
    (
        LinkRole::Generic,
        &["a[href]", "link[rel='canonical'][href]"],
    ),
];

/// Elements and attributes a browser would fetch when the page is interacted with
const SUBRESOURCE_SELECTORS: &[(&str, &str)] = &[
    ("link[rel='next'][href]", "href"),
    ("link[rel='prefetch'][href]", "href"),
    ("[data-url]", "data-url"),
    ("[data-href]", "data-href"),
    ("[data-next-page]", "data-next-page"),
    ("[hx-get]", "hx-get"),
];

/// A resolved link with the role of the region it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    pub url: Url,
    pub role: LinkRole,
}

/// Compiled selector table
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    groups: Vec<(LinkRole, Vec<Selector>)>,
    subresources: Vec<(Selector, &'static str)>,
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkExtractor {
    pub fn new() -> Self {
        let groups = LINK_SELECTOR_GROUPS
            .iter()
            .map(|(role, selectors)| {
                let compiled = selectors
                    .iter()
                    .filter_map(|s| Selector::parse(s).ok())
                    .collect();
                (*role, compiled)
            })
            .collect();

        let subresources = SUBRESOURCE_SELECTORS
            .iter()
            .filter_map(|(s, attr)| Selector::parse(s).ok().map(|sel| (sel, *attr)))
            .collect();

        Self {
            groups,
            subresources,
        }
    }

    /// Extracts every followable link from `html`
    ///
    /// # Arguments
    ///
    /// * `html` - The fetched page
    /// * `base_url` - The page's own URL, used to resolve relative hrefs
    ///
    /// # Returns
    ///
    /// Links de-duplicated per page, in selector-table order
    pub fn extract(&self, html: &str, base_url: &Url) -> Vec<ExtractedLink> {
        let document = Html::parse_document(html);
        let base = document_base(&document, base_url);

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for (role, selectors) in &self.groups {
            for selector in selectors {
                for element in document.select(selector) {
                    if element.value().attr("download").is_some() {
                        continue;
                    }
                    let Some(url) = element
                        .value()
                        .attr("href")
                        .and_then(|href| resolve_link(href, &base))
                    else {
                        continue;
                    };
                    if seen.insert(url.to_string()) {
                        links.push(ExtractedLink { url, role: *role });
                    }
                }
            }
        }

        links
    }

    /// Extracts URLs the page would load on interaction
    ///
    /// Covers `link[rel=next|prefetch]` and the data attributes that
    /// infinite-scroll and "load more" widgets read their next URL from.
    pub fn subresources(&self, html: &str, base_url: &Url) -> Vec<Url> {
        let document = Html::parse_document(html);
        let base = document_base(&document, base_url);

        let mut seen = HashSet::new();
        self.subresources
            .iter()
            .flat_map(|(selector, attr)| {
                document
                    .select(selector)
                    .filter_map(|el: ElementRef| el.value().attr(attr))
                    .collect::<Vec<_>>()
            })
            .filter_map(|raw| resolve_link(raw, &base))
            .filter(|url| seen.insert(url.to_string()))
            .collect()
    }
}

/// Honors `<base href>` when the page declares one
fn document_base(document: &Html, page_url: &Url) -> Url {
    Selector::parse("base[href]")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| page_url.join(href.trim()).ok())
        .unwrap_or_else(|| page_url.clone())
}

/// Resolves an href to an absolute http(s) URL without fragment
///
/// Returns None for `javascript:`, `mailto:`, `tel:` and `data:` links,
/// fragment-only links and anything that does not resolve.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let mut url = base_url.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}
