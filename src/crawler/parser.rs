//! HTML link extraction
//!
//! Parsing is lenient: scraper builds a tree for any input, so malformed
//! markup degrades to whatever links can still be found, possibly none.

use crate::url::{normalize, CanonicalUrl};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

fn anchor_selector() -> Option<&'static Selector> {
    static SELECTOR: OnceLock<Option<Selector>> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("a[href]").ok()).as_ref()
}

fn base_selector() -> Option<&'static Selector> {
    static SELECTOR: OnceLock<Option<Selector>> = OnceLock::new();
    SELECTOR
        .get_or_init(|| Selector::parse("base[href]").ok())
        .as_ref()
}

/// Extracts the followable links of an HTML page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` targets, resolved against `<base href>` when present,
///   otherwise against the page URL
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - Fragment-only links
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - Anything that is not http(s) after resolution
///
/// **Note:** `rel="nofollow"` links ARE followed
///
/// Links are canonicalized and deduplicated; first occurrence order is kept.
/// Scope filtering is left to the frontier.
///
/// # Example
///
/// ```
/// use sitescribe::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/about#team">About</a><a href="mailto:x@example.com">Mail</a>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, &base);
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://example.com/about");
/// ```
pub fn extract_links(html: &str, page_url: &Url) -> Vec<CanonicalUrl> {
    let Some(anchors) = anchor_selector() else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let base = document_base(&document, page_url);

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(anchors) {
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };

        match normalize(href, Some(&base)) {
            Ok(link) => {
                if seen.insert(link.clone()) {
                    links.push(link);
                }
            }
            Err(e) => {
                tracing::trace!(href = href, error = %e, "Skipping link");
            }
        }
    }

    links
}

/// Resolves the effective base URL of a document
fn document_base(document: &Html, page_url: &Url) -> Url {
    base_selector()
        .and_then(|selector| document.select(selector).next())
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| page_url.join(href.trim()).ok())
        .filter(|base| base.scheme() == "http" || base.scheme() == "https")
        .unwrap_or_else(|| page_url.clone())
}
