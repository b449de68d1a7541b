use url::Url;

/// Extracts the lowercase host from a URL
///
/// Returns `None` when the URL has no host.
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the host with a leading `www.` removed
///
/// Used to decide whether two URLs belong to the same site; the frontier key
/// itself keeps `www.` as served.
pub fn site_host(url: &Url) -> Option<String> {
    extract_domain(url).map(|host| match host.strip_prefix("www.") {
        Some(bare) => bare.to_string(),
        None => host,
    })
}

/// Checks whether `candidate` lives on the same site as `origin`
///
/// Subdomains of the origin count as the same site (`shop.example.com` is
/// on-site for a crawl seeded at `www.example.com`).
pub fn is_same_site(origin: &Url, candidate: &Url) -> bool {
    match (site_host(origin), site_host(candidate)) {
        (Some(origin), Some(candidate)) => {
            candidate == origin || candidate.ends_with(&format!(".{}", origin))
        }
        _ => false,
    }
}

/// Checks if a domain matches a wildcard pattern
///
/// `"example.com"` matches only itself; `"*.example.com"` matches the bare
/// domain and any subdomain of it.
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base || candidate.ends_with(&format!(".{}", base))
    } else {
        candidate == pattern
    }
}
