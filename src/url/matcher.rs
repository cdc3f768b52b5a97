use crate::url::domain::strip_www;
use url::Url;

/// Checks if a host falls inside an allowed domain
///
/// A host matches when it equals the allowed domain or is a subdomain of it
/// (suffix match on `"." + allowed`). A `www.` prefix on either side is
/// ignored, and the comparison is case-insensitive.
///
/// # Examples
///
/// ```
/// use sitescribe::url::matches_domain;
///
/// assert!(matches_domain("example.com", "example.com"));
/// assert!(matches_domain("www.example.com", "example.com"));
/// assert!(matches_domain("api.v2.example.com", "www.example.com"));
/// assert!(!matches_domain("notexample.com", "example.com"));
/// ```
pub fn matches_domain(host: &str, allowed_domain: &str) -> bool {
    let host = strip_www(host.trim_end_matches('.')).to_lowercase();
    let allowed = strip_www(allowed_domain.trim_end_matches('.')).to_lowercase();

    if host.is_empty() || allowed.is_empty() {
        return false;
    }

    host == allowed || host.ends_with(&format!(".{}", allowed))
}

/// Checks if a URL string lies within the allowed domain
///
/// Unparseable URLs and URLs without a host are never in scope.
///
/// ```
/// use sitescribe::url::is_in_scope;
///
/// assert!(is_in_scope("https://docs.example.com/x", "example.com"));
/// assert!(!is_in_scope("https://notexample.com", "example.com"));
/// ```
pub fn is_in_scope(url: &str, allowed_domain: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| matches_domain(h, allowed_domain)))
        .unwrap_or(false)
}
