//! Extraction pipeline
//!
//! Turns discovered URLs into clean documents:
//! - Title extraction from `<title>`
//! - Main-content extraction with boilerplate removal, rendered as Markdown
//! - A bounded, polite worker pool over the discovery records
//!
//! A page that cannot be fetched or parsed never stops the batch; it yields
//! an [`ExtractedDocument`] carrying an [`ExtractionFailure`] instead.

mod content;
mod pipeline;
mod title;

pub use content::extract_main_content;
pub use pipeline::{ExtractionPipeline, PageExtractor};
pub use title::extract_title;

use crate::crawler::FetchError;
use thiserror::Error;

/// Why a page produced no content
#[derive(Debug, Clone, Error)]
pub enum ExtractionFailure {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("could not process page: {0}")]
    Parse(String),

    #[error("no main content found")]
    NoContent,
}

/// The result of extracting one page
///
/// Always produced, even on failure; in that case `content` is None and
/// `failure` says why.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// The URL as read from the discovery file
    pub url: String,
    /// Directory name the document is filed under
    pub domain: String,
    pub title: Option<String>,
    /// Markdown body
    pub content: Option<String>,
    pub failure: Option<ExtractionFailure>,
}

impl ExtractedDocument {
    /// A successful extraction; empty content is stored as None
    pub fn new(
        url: impl Into<String>,
        domain: impl Into<String>,
        title: Option<String>,
        content: Option<String>,
    ) -> Self {
        let content = content.filter(|c| !c.trim().is_empty());
        let failure = content.is_none().then_some(ExtractionFailure::NoContent);
        Self {
            url: url.into(),
            domain: domain.into(),
            title,
            content,
            failure,
        }
    }

    /// A failed extraction with no title or content
    pub fn failed(
        url: impl Into<String>,
        domain: impl Into<String>,
        failure: ExtractionFailure,
    ) -> Self {
        Self {
            url: url.into(),
            domain: domain.into(),
            title: None,
            content: None,
            failure: Some(failure),
        }
    }

    /// Returns true when there is content worth writing
    pub fn has_content(&self) -> bool {
        self.content.as_deref().is_some_and(|c| !c.trim().is_empty())
    }
}
