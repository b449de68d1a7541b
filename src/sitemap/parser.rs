use crate::sitemap::SitemapError;
use quick_xml::events::Event;
use quick_xml::Reader;
use url::Url;

/// A parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<urlset>`: page locations
    UrlSet(Vec<String>),
    /// `<sitemapindex>`: locations of further sitemaps
    Index(Vec<String>),
}

impl SitemapDocument {
    pub fn locations(&self) -> &[String] {
        match self {
            SitemapDocument::UrlSet(locs) | SitemapDocument::Index(locs) => locs,
        }
    }
}

/// Parses sitemap XML fetched from `source`
///
/// Relative `<loc>` values are resolved against `source`. Namespace prefixes
/// are ignored.
///
/// # Errors
///
/// `Xml` if the reader rejects the document, `NotASitemap` if the root element
/// is neither `urlset` nor `sitemapindex`.
pub fn parse_sitemap(source: &Url, xml: &str) -> Result<SitemapDocument, SitemapError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut root: Option<String> = None;
    let mut in_loc = false;
    let mut locs = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| SitemapError::Xml {
            url: source.to_string(),
            message: format!("at byte {}: {}", reader.buffer_position(), e),
        })?;

        match event {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                if root.is_none() {
                    if name != "urlset" && name != "sitemapindex" {
                        return Err(SitemapError::NotASitemap {
                            url: source.to_string(),
                            root: name,
                        });
                    }
                    root = Some(name);
                } else if name == "loc" {
                    in_loc = true;
                }
            }
            Event::Empty(e) if root.is_none() => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                if name != "urlset" && name != "sitemapindex" {
                    return Err(SitemapError::NotASitemap {
                        url: source.to_string(),
                        root: name,
                    });
                }
                root = Some(name);
            }
            Event::End(e) => {
                if e.local_name().as_ref().eq_ignore_ascii_case(b"loc") {
                    in_loc = false;
                }
            }
            Event::Text(t) if in_loc => {
                let text = t.unescape().map_err(|e| SitemapError::Xml {
                    url: source.to_string(),
                    message: e.to_string(),
                })?;
                push_location(&mut locs, source, &text);
            }
            Event::CData(c) if in_loc => {
                let raw = c.into_inner();
                push_location(&mut locs, source, &String::from_utf8_lossy(&raw));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match root.as_deref() {
        Some("sitemapindex") => Ok(SitemapDocument::Index(locs)),
        Some(_) => Ok(SitemapDocument::UrlSet(locs)),
        None => Err(SitemapError::NotASitemap {
            url: source.to_string(),
            root: String::new(),
        }),
    }
}

fn push_location(locs: &mut Vec<String>, source: &Url, raw: &str) {
    let raw = raw.trim();
    if raw.is_empty() {
        return;
    }
    match Url::parse(raw).or_else(|_| source.join(raw)) {
        Ok(url) => locs.push(url.to_string()),
        Err(_) => locs.push(raw.to_string()),
    }
}
