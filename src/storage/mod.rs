//! Storage module for the discovery sink
//!
//! This module handles persistence of crawl results, including:
//! - The JSON-lines discovery file written during the crawl
//! - Reading that file back as input to the extraction phase
//! - Deriving the discovery file location for a crawl target

mod jsonl;
mod memory;
mod traits;

pub use jsonl::{read_discovery_file, JsonlDiscoverySink};
pub use memory::MemoryDiscoverySink;
pub use traits::{DiscoverySink, StorageError, StorageResult};

use crate::url::CanonicalUrl;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One confirmed in-scope URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryRecord {
    /// Absolute canonical URL
    pub url: String,
}

impl DiscoveryRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl From<&CanonicalUrl> for DiscoveryRecord {
    fn from(url: &CanonicalUrl) -> Self {
        Self::new(url.as_str())
    }
}

/// Turns a host (or any label) into a safe file-name stem
///
/// Dots and slashes become underscores; anything else outside
/// `[A-Za-z0-9_-]` is dropped.
///
/// # Example
///
/// ```
/// use sitescribe::storage::sanitize_file_stem;
///
/// assert_eq!(sanitize_file_stem("www.example.com:8080"), "www_example_com8080");
/// assert_eq!(sanitize_file_stem("???"), "default");
/// ```
pub fn sanitize_file_stem(name: &str) -> String {
    let name = name
        .strip_prefix("https://")
        .or_else(|| name.strip_prefix("http://"))
        .unwrap_or(name);

    let sanitized: String = name
        .chars()
        .filter_map(|c| match c {
            '.' | '/' => Some('_'),
            c if c.is_ascii_alphanumeric() || c == '_' || c == '-' => Some(c),
            _ => None,
        })
        .collect();

    if sanitized.is_empty() {
        "default".to_string()
    } else {
        sanitized
    }
}

/// Location of the discovery file for a seed URL
///
/// # Arguments
///
/// * `dir` - Directory holding discovery files
/// * `seed` - The crawl's seed URL; its host names the file
/// * `file_name` - Explicit file name, overriding the derived one
///
/// # Returns
///
/// `<dir>/<file_name>` or `<dir>/<sanitized_host>_urls.jsonl`
pub fn discovery_path(dir: &Path, seed: &CanonicalUrl, file_name: Option<&str>) -> PathBuf {
    match file_name {
        Some(name) => dir.join(name),
        None => {
            let netloc = match (seed.host(), seed.as_url().port()) {
                (Some(host), Some(port)) => format!("{}:{}", host, port),
                (Some(host), None) => host.to_string(),
                (None, _) => "unknown_url".to_string(),
            };
            dir.join(format!("{}_urls.jsonl", sanitize_file_stem(&netloc)))
        }
    }
}
