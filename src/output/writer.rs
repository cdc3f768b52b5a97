//! Document writer
//!
//! Files each extracted document under `<root>/<domain>/<name>.md`, where the
//! name comes from the last segment of the URL path.

use crate::extract::ExtractedDocument;
use crate::output::markdown::render_document;
use crate::output::traits::{DocumentSink, OutputError, OutputResult, WriteOutcome};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use url::Url;

/// Directory used when a document has no usable domain
const UNKNOWN_DOMAIN: &str = "unknown_domain";

/// Derives a filesystem-safe document name (without extension) for a URL
///
/// # Naming Rules
///
/// - The last non-empty path segment is used, as the URL carries it
///   (percent-encoding is kept)
/// - Its extension is stripped (`guide.html` → `guide`)
/// - Characters outside `[A-Za-z0-9_.-]` become `_`; leading dots are trimmed
/// - The root path yields `index`
/// - An unparsable URL, or a segment with nothing usable left, yields
///   `page_<index + 1>`
///
/// # Example
///
/// ```
/// use sitescribe::output::derive_document_name;
///
/// assert_eq!(derive_document_name("https://example.com/docs/intro.html", 0), "intro");
/// assert_eq!(derive_document_name("https://example.com/", 0), "index");
/// assert_eq!(derive_document_name("not a url", 4), "page_5");
/// ```
pub fn derive_document_name(url: &str, index: usize) -> String {
    let placeholder = || format!("page_{}", index + 1);

    let Ok(parsed) = Url::parse(url) else {
        return placeholder();
    };

    let Some(segment) = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
    else {
        return "index".to_string();
    };

    let stem = match segment.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => segment,
    };

    let sanitized: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = sanitized.trim_start_matches('.');

    if sanitized.chars().any(|c| c.is_ascii_alphanumeric()) {
        sanitized.to_string()
    } else {
        placeholder()
    }
}

/// Directory name for a URL's documents: the host, plus `_port` for
/// non-default ports
///
/// # Example
///
/// ```
/// use sitescribe::output::domain_dir_name;
/// use url::Url;
///
/// let url = Url::parse("http://127.0.0.1:8080/a").unwrap();
/// assert_eq!(domain_dir_name(&url), "127.0.0.1_8080");
/// ```
pub fn domain_dir_name(url: &Url) -> String {
    let Some(host) = url.host_str().filter(|h| !h.is_empty()) else {
        return UNKNOWN_DOMAIN.to_string();
    };

    let host: String = host
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    match url.port() {
        Some(port) => format!("{host}_{port}"),
        None => host,
    }
}

/// Writes documents as Markdown files under a root directory
#[derive(Debug)]
pub struct DocumentWriter {
    root: PathBuf,
    // path -> URL that produced it, for collision reporting
    written: Mutex<HashMap<PathBuf, String>>,
}

impl DocumentWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            written: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where a document would be written
    pub fn document_path(&self, doc: &ExtractedDocument, index: usize) -> PathBuf {
        let domain = if doc.domain.trim().is_empty() {
            UNKNOWN_DOMAIN
        } else {
            doc.domain.as_str()
        };
        self.root
            .join(domain)
            .join(format!("{}.md", derive_document_name(&doc.url, index)))
    }

    /// Number of distinct paths written so far
    pub fn written_count(&self) -> usize {
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl DocumentSink for DocumentWriter {
    fn write(&self, doc: &ExtractedDocument, index: usize) -> OutputResult<WriteOutcome> {
        if !doc.has_content() {
            tracing::info!(url = %doc.url, "No content extracted, skipping file");
            return Ok(WriteOutcome::SkippedEmpty);
        }

        let path = self.document_path(doc, index);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        fs::write(&path, render_document(doc)).map_err(|source| OutputError::Write {
            path: path.clone(),
            source,
        })?;

        let previous = self
            .written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.clone(), doc.url.clone());

        match previous {
            Some(previous_url) if previous_url != doc.url => {
                tracing::warn!(
                    path = %path.display(),
                    url = %doc.url,
                    previous_url = %previous_url,
                    "Document name collision, earlier file overwritten"
                );
                Ok(WriteOutcome::Overwrote { path, previous_url })
            }
            _ => {
                tracing::debug!(url = %doc.url, path = %path.display(), "Saved document");
                Ok(WriteOutcome::Written(path))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn doc(url: &str, content: Option<&str>) -> ExtractedDocument {
        let domain = Url::parse(url)
            .map(|u| domain_dir_name(&u))
            .unwrap_or_default();
        ExtractedDocument::new(
            url,
            domain,
            Some("Title".to_string()),
            content.map(str::to_string),
        )
    }

    #[test]
    fn test_derive_document_name() {
        assert_eq!(derive_document_name("https://example.com/about", 0), "about");
        assert_eq!(derive_document_name("https://example.com/docs/guide.html", 0), "guide");
        assert_eq!(derive_document_name("https://example.com/docs/", 0), "docs");
        assert_eq!(derive_document_name("https://example.com", 0), "index");
        assert_eq!(derive_document_name("https://example.com/?q=1", 0), "index");
        assert_eq!(derive_document_name("https://example.com/a%20b", 0), "a_20b");
        assert_eq!(derive_document_name("https://example.com/.env", 0), "env");
        assert_eq!(derive_document_name("https://example.com/v1.2.3", 0), "v1.2");
        assert_eq!(derive_document_name("https://example.com/%E2%9C%93", 2), "_E2_9C_93");
        assert_eq!(derive_document_name("https://example.com/@@", 2), "page_3");
        assert_eq!(derive_document_name("", 0), "page_1");
    }

    #[test]
    fn test_domain_dir_name() {
        let url = Url::parse("https://Example.com/a").unwrap();
        assert_eq!(domain_dir_name(&url), "example.com");

        let url = Url::parse("https://example.com:443/a").unwrap();
        assert_eq!(domain_dir_name(&url), "example.com");

        let url = Url::parse("http://localhost:3000/").unwrap();
        assert_eq!(domain_dir_name(&url), "localhost_3000");
    }

    #[test]
    fn test_write_document() {
        let dir = TempDir::new().unwrap();
        let writer = DocumentWriter::new(dir.path());

        let outcome = writer
            .write(&doc("https://example.com/about", Some("About us")), 0)
            .unwrap();

        let expected = dir.path().join("example.com").join("about.md");
        assert_eq!(outcome, WriteOutcome::Written(expected.clone()));

        let written = fs::read_to_string(expected).unwrap();
        assert!(written.starts_with("---\nsite_url: \"https://example.com/about\"\n"));
        assert!(written.contains("About us"));
    }

    #[test]
    fn test_empty_content_not_written() {
        let dir = TempDir::new().unwrap();
        let writer = DocumentWriter::new(dir.path());

        let outcome = writer.write(&doc("https://example.com/empty", None), 0).unwrap();
        assert_eq!(outcome, WriteOutcome::SkippedEmpty);
        assert!(!dir.path().join("example.com").join("empty.md").exists());
        assert_eq!(writer.written_count(), 0);
    }

    #[test]
    fn test_collision_overwrites() {
        let dir = TempDir::new().unwrap();
        let writer = DocumentWriter::new(dir.path());

        writer
            .write(&doc("https://example.com/blog/intro", Some("Blog intro")), 0)
            .unwrap();
        let outcome = writer
            .write(&doc("https://example.com/docs/intro", Some("Docs intro")), 1)
            .unwrap();

        let path = dir.path().join("example.com").join("intro.md");
        assert_eq!(
            outcome,
            WriteOutcome::Overwrote {
                path: path.clone(),
                previous_url: "https://example.com/blog/intro".to_string(),
            }
        );
        assert!(fs::read_to_string(path).unwrap().contains("Docs intro"));
        assert_eq!(writer.written_count(), 1);
    }

    #[test]
    fn test_same_url_rewrite_is_not_collision() {
        let dir = TempDir::new().unwrap();
        let writer = DocumentWriter::new(dir.path());
        let page = doc("https://example.com/page", Some("Content"));

        writer.write(&page, 0).unwrap();
        let outcome = writer.write(&page, 0).unwrap();
        assert!(matches!(outcome, WriteOutcome::Written(_)));
    }

    #[test]
    fn test_unwritable_root_is_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        let writer = DocumentWriter::new(&blocker);
        let result = writer.write(&doc("https://example.com/a", Some("A")), 0);
        assert!(matches!(result, Err(OutputError::CreateDir { .. })));
    }
}
