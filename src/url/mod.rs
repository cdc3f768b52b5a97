//! URL handling module for Sitescribe
//!
//! This module provides URL normalization, domain extraction and the domain
//! scope predicate that restricts a crawl to one site.

mod domain;
mod matcher;
mod normalize;

use std::fmt;
use url::Url;

// Re-export main functions
pub use domain::{extract_domain, strip_www};
pub use matcher::{is_in_scope, matches_domain};
pub use normalize::{normalize, normalize_url};

/// A normalized URL used as the identity key for deduplication
///
/// Two URLs that differ only by fragment, or by the case of their scheme or
/// host, produce the same `CanonicalUrl`. Query strings are kept verbatim:
/// distinct query strings are distinct pages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalUrl(Url);

impl CanonicalUrl {
    /// Returns the canonical URL as a string slice
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the underlying parsed URL
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Consumes the canonical URL, returning the parsed URL
    pub fn into_url(self) -> Url {
        self.0
    }

    /// Returns the host (already lowercase)
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    /// Returns the URL path
    pub fn path(&self) -> &str {
        self.0.path()
    }

    /// Checks whether this URL lies inside `allowed_domain` or one of its subdomains
    pub fn is_in_scope(&self, allowed_domain: &str) -> bool {
        self.host()
            .map(|host| matches_domain(host, allowed_domain))
            .unwrap_or(false)
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
