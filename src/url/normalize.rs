use crate::url::CanonicalUrl;
use crate::UrlError;
use url::Url;

/// Schemes that are rejected before any resolution is attempted
const REJECTED_SCHEMES: &[&str] = &["mailto:", "tel:", "javascript:", "data:"];

/// Normalizes a possibly-relative link into a canonical URL
///
/// # Normalization Steps
///
/// 1. Reject empty links, fragment-only links (`#...`) and non-web schemes
///    (`mailto:`, `tel:`, `javascript:`, `data:`)
/// 2. Resolve against `base` when one is given
/// 3. Require an `http` or `https` scheme and a host
/// 4. Lowercase scheme and host (done by the parser for web schemes)
/// 5. Normalize the path:
///    - Collapse repeated slashes
///    - Remove dot segments (. and ..)
///    - Remove trailing slash (except for root /)
///    - Empty path becomes /
/// 6. Remove the fragment
///
/// The query string is left untouched.
///
/// # Examples
///
/// ```
/// use sitescribe::url::normalize;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/docs/").unwrap();
/// let url = normalize("../about/#team", Some(&base)).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/about");
///
/// assert!(normalize("mailto:hi@example.com", Some(&base)).is_err());
/// assert!(normalize("#top", Some(&base)).is_err());
/// ```
pub fn normalize(raw: &str, base: Option<&Url>) -> Result<CanonicalUrl, UrlError> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(UrlError::Empty);
    }

    if raw.starts_with('#') {
        return Err(UrlError::FragmentOnly(raw.to_string()));
    }

    if let Some(scheme) = rejected_scheme(raw) {
        return Err(UrlError::InvalidScheme(scheme.trim_end_matches(':').to_string()));
    }

    let url = match base {
        Some(base) => base.join(raw),
        None => Url::parse(raw),
    }
    .map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    canonicalize(url)
}

/// Normalizes an absolute URL string
///
/// # Examples
///
/// ```
/// use sitescribe::url::normalize_url;
///
/// let url = normalize_url("HTTPS://EXAMPLE.COM/page/#section").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<CanonicalUrl, UrlError> {
    normalize(url_str, None)
}

/// Applies the canonical form to an already-parsed URL
fn canonicalize(mut url: Url) -> Result<CanonicalUrl, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingDomain),
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    Ok(CanonicalUrl(url))
}

/// Returns the rejected scheme prefix a raw link starts with, if any
fn rejected_scheme(raw: &str) -> Option<&'static str> {
    REJECTED_SCHEMES.iter().copied().find(|scheme| {
        raw.get(..scheme.len())
            .map(|prefix| prefix.eq_ignore_ascii_case(scheme))
            .unwrap_or(false)
    })
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            // Empty segments come from repeated slashes
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", normalized_segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/docs/guide").unwrap()
    }

    #[test]
    fn test_fragment_stripped_to_same_identity() {
        let with_fragment = normalize_url("https://a.com/p#frag").unwrap();
        let without = normalize_url("https://a.com/p").unwrap();
        assert_eq!(with_fragment, without);
    }

    #[test]
    fn test_scheme_and_host_case_folded() {
        let upper = normalize_url("HTTPS://A.COM/Path").unwrap();
        let lower = normalize_url("https://a.com/Path").unwrap();
        assert_eq!(upper, lower);
        // Path case is significant
        assert_eq!(upper.as_str(), "https://a.com/Path");
    }

    #[test]
    fn test_http_is_not_upgraded() {
        let result = normalize_url("http://example.com/page").unwrap();
        assert_eq!(result.as_str(), "http://example.com/page");
    }

    #[test]
    fn test_www_is_kept() {
        let result = normalize_url("https://www.example.com/").unwrap();
        assert_eq!(result.as_str(), "https://www.example.com/");
    }

    #[test]
    fn test_remove_trailing_slash() {
        let result = normalize_url("https://example.com/page/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_keep_root_slash() {
        let result = normalize_url("https://example.com/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_empty_path_becomes_root() {
        let result = normalize_url("https://example.com").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_query_preserved() {
        let a = normalize_url("https://example.com/list?page=2&sort=asc").unwrap();
        let b = normalize_url("https://example.com/list?page=3&sort=asc").unwrap();
        assert_eq!(a.as_str(), "https://example.com/list?page=2&sort=asc");
        assert_ne!(a, b);
    }

    #[test]
    fn test_query_preserved_with_fragment() {
        let result = normalize_url("https://example.com/list?utm_source=x#top").unwrap();
        assert_eq!(result.as_str(), "https://example.com/list?utm_source=x");
    }

    #[test]
    fn test_default_port_dropped() {
        let result = normalize_url("https://example.com:443/a").unwrap();
        assert_eq!(result.as_str(), "https://example.com/a");
        let result = normalize_url("http://example.com:8080/a").unwrap();
        assert_eq!(result.as_str(), "http://example.com:8080/a");
    }

    #[test]
    fn test_normalize_path_with_dots() {
        let result = normalize_url("https://example.com/a/../b/./c").unwrap();
        assert_eq!(result.as_str(), "https://example.com/b/c");
    }

    #[test]
    fn test_multiple_slashes() {
        let result = normalize_url("https://example.com///path//to///page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/path/to/page");
    }

    #[test]
    fn test_relative_resolution() {
        assert_eq!(
            normalize("intro", Some(&base())).unwrap().as_str(),
            "https://example.com/docs/intro"
        );
        assert_eq!(
            normalize("/about", Some(&base())).unwrap().as_str(),
            "https://example.com/about"
        );
        assert_eq!(
            normalize("//cdn.example.com/x", Some(&base())).unwrap().as_str(),
            "https://cdn.example.com/x"
        );
        assert_eq!(
            normalize("?page=2", Some(&base())).unwrap().as_str(),
            "https://example.com/docs/guide?page=2"
        );
    }

    #[test]
    fn test_rejected_schemes() {
        for link in [
            "mailto:test@example.com",
            "MAILTO:test@example.com",
            "tel:+1234567890",
            "javascript:void(0)",
            "data:text/html,<h1>x</h1>",
        ] {
            assert!(
                matches!(normalize(link, Some(&base())), Err(UrlError::InvalidScheme(_))),
                "{} should be rejected",
                link
            );
        }
    }

    #[test]
    fn test_other_schemes_rejected_after_resolution() {
        assert!(matches!(
            normalize("ftp://example.com/file", Some(&base())),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_fragment_only_rejected() {
        assert!(matches!(
            normalize("#section", Some(&base())),
            Err(UrlError::FragmentOnly(_))
        ));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(normalize("   ", Some(&base())), Err(UrlError::Empty)));
    }

    #[test]
    fn test_relative_without_base() {
        assert!(matches!(normalize_url("/about"), Err(UrlError::Parse(_))));
    }

    #[test]
    fn test_malformed_url() {
        assert!(normalize_url("not a url").is_err());
    }
}
