use crate::config::ContentConfig;
use scraper::{ElementRef, Html, Selector};

/// Boilerplate stripped before any text is read
pub const REMOVE_SELECTORS: &[&str] = &[
    "script",
    "style",
    "noscript",
    "template",
    "svg",
    "iframe",
    "nav",
    "header",
    "footer",
    "aside",
    "form",
    "button",
    "select",
    "[role='navigation']",
    "[role='banner']",
    "[role='contentinfo']",
    "[role='dialog']",
    ".advertisement",
    ".ads",
    ".ad-banner",
    "[id^='google_ads']",
    ".popup",
    ".modal",
    ".newsletter",
    "[class*='cookie']",
    "[id*='cookie']",
    ".breadcrumb",
    ".breadcrumbs",
    ".social-share",
];

/// Main-content containers, highest priority first
pub const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    "[role='main']",
    "#content",
    "#main",
    ".main-content",
    ".page-content",
    ".post-content",
    ".entry-content",
    ".article-content",
    ".product-description",
    ".product-details",
    "[itemprop='description']",
    ".content",
];

const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ul", "ol", "tr", "td", "th",
    "blockquote", "section", "article", "main", "pre", "dd", "dt", "figcaption", "table",
];

/// Pulls the main text out of an HTML page
#[derive(Debug, Clone)]
pub struct TextExtractor {
    remove: Vec<Selector>,
    candidates: Vec<Selector>,
    min_candidate_chars: usize,
}

impl TextExtractor {
    pub fn new(config: &ContentConfig) -> Self {
        let remove = REMOVE_SELECTORS
            .iter()
            .copied()
            .chain(config.extra_remove_selectors.iter().map(String::as_str))
            .filter_map(|s| Selector::parse(s).ok())
            .collect();

        let candidates = CONTENT_SELECTORS
            .iter()
            .copied()
            .chain(config.extra_content_selectors.iter().map(String::as_str))
            .filter_map(|s| Selector::parse(s).ok())
            .collect();

        Self {
            remove,
            candidates,
            min_candidate_chars: config.min_candidate_chars,
        }
    }

    /// Returns the page title and its whitespace-normalized main text
    ///
    /// Every candidate container is measured and the longest wins. When no
    /// candidate reaches the minimum length the whole body is used instead.
    pub fn extract(&self, html: &str) -> (Option<String>, String) {
        let document = Html::parse_document(html);
        let title = extract_title(&document);

        let mut best = String::new();
        for selector in &self.candidates {
            for element in document.select(selector) {
                if self.is_removed(&element) || self.has_removed_ancestor(&element) {
                    continue;
                }
                let text = self.element_text(element);
                if text.chars().count() > best.chars().count() {
                    best = text;
                }
            }
        }

        if best.chars().count() < self.min_candidate_chars {
            if let Some(body) = Selector::parse("body")
                .ok()
                .and_then(|sel| document.select(&sel).next())
            {
                best = self.element_text(body);
            }
        }

        (title, best)
    }

    fn is_removed(&self, element: &ElementRef) -> bool {
        self.remove.iter().any(|sel| sel.matches(element))
    }

    fn has_removed_ancestor(&self, element: &ElementRef) -> bool {
        element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| self.is_removed(&ancestor))
    }

    fn element_text(&self, element: ElementRef) -> String {
        let mut raw = String::new();
        self.collect_text(element, &mut raw);
        normalize_whitespace(&raw)
    }

    fn collect_text(&self, element: ElementRef, out: &mut String) {
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                out.push_str(text);
            } else if let Some(child_element) = ElementRef::wrap(child) {
                if self.is_removed(&child_element) {
                    continue;
                }
                let block = BLOCK_ELEMENTS.contains(&child_element.value().name());
                if block {
                    out.push(' ');
                }
                self.collect_text(child_element, out);
                if block {
                    out.push(' ');
                }
            }
        }
    }
}

/// Collapses every run of whitespace to one space
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `<title>` text, falling back to the first `<h1>`
fn extract_title(document: &Html) -> Option<String> {
    ["title", "h1"].iter().find_map(|tag| {
        let selector = Selector::parse(tag).ok()?;
        document
            .select(&selector)
            .next()
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .filter(|s| !s.is_empty())
    })
}
