use crate::UrlError;
use url::Url;

/// Query parameters that only carry campaign or click tracking
const TRACKING_PARAMS: &[&str] = &[
    "fbclid",
    "gclid",
    "gclsrc",
    "dclid",
    "msclkid",
    "yclid",
    "mc_eid",
    "mc_cid",
    "_ga",
    "_gl",
    "igshid",
    "srsltid",
    "ref",
    "ref_src",
];

/// Canonicalizes a URL so that equivalent spellings map to one frontier key
///
/// The scheme is kept but must be http or https. The host is lowercased,
/// dot segments and repeated or trailing slashes are collapsed (an empty
/// path becomes `/`), the fragment is dropped, and tracking parameters
/// (`utm_*`, click ids) are removed. Remaining query pairs are ordered by
/// key, keeping the relative order of repeated keys.
///
/// ```
/// use deepsweep::url::normalize_url;
///
/// let url = normalize_url("https://Shop.EXAMPLE.com/sale/?utm_source=x#top").unwrap();
/// assert_eq!(url.as_str(), "https://shop.example.com/sale");
/// ```
pub fn normalize_url(raw: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::InvalidScheme(other.to_string())),
    }

    let host = match url.host_str() {
        Some(h) if !h.is_empty() => h.to_lowercase(),
        _ => return Err(UrlError::MissingDomain),
    };
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("{host}: {e}")))?;

    let path = collapse_path(url.path());
    url.set_path(&path);
    url.set_fragment(None);

    let kept = retained_query(&url);
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    Ok(url)
}

/// Resolves `.` and `..` segments and drops empty ones
fn collapse_path(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for segment in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
        if segment == ".." {
            stack.pop();
        } else {
            stack.push(segment);
        }
    }
    format!("/{}", stack.join("/"))
}

/// Query pairs without tracking keys, stably ordered by key
fn retained_query(url: &Url) -> Vec<(String, String)> {
    if url.query().is_none() {
        return Vec::new();
    }
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !key.is_empty() && !is_tracking_key(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort_by(|(a, _), (b, _)| a.cmp(b));
    pairs
}

fn is_tracking_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}
