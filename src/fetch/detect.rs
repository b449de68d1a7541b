use scraper::{ElementRef, Html};

use crate::content::normalize_whitespace;

/// Phrases that only appear on bot-challenge and block pages
pub const BLOCK_PHRASES: &[&str] = &[
    "captcha",
    "access denied",
    "unusual traffic",
    "verify you are a human",
    "are you a robot",
    "checking your browser",
    "please enable javascript and cookies",
    "request blocked",
    "suspicious activity",
    "bot detection",
    "press & hold",
];

/// Elements whose contents never render as page text
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Returns the block signal found in a response, if any
///
/// HTTP 429 always counts as a block. Otherwise the rendered text of the
/// page, title included, is scanned case-insensitively for
/// [`BLOCK_PHRASES`]. Markup, attributes and script bodies are ignored so a
/// page that merely loads a captcha widget is not mistaken for a challenge.
pub fn detect_block(status: u16, html: &str) -> Option<String> {
    if status == 429 {
        return Some("http 429".to_string());
    }

    let document = Html::parse_document(html);
    let mut text = String::new();
    collect_visible_text(document.root_element(), &mut text);

    let lower = normalize_whitespace(&text).to_lowercase();
    BLOCK_PHRASES
        .iter()
        .find(|phrase| lower.contains(*phrase))
        .map(|phrase| phrase.to_string())
}

fn collect_visible_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if HIDDEN_ELEMENTS.contains(&child_element.value().name()) {
                continue;
            }
            out.push(' ');
            collect_visible_text(child_element, out);
        }
    }
}
