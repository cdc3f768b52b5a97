//! Document sink traits and types
//!
//! This module defines the trait interface for document sinks and the
//! outcome of persisting a single extracted document.

use crate::extract::ExtractedDocument;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting documents
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// What happened to a document handed to a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Written to a path not used before in this run
    Written(PathBuf),

    /// Replaced a file written earlier in this run for another URL
    Overwrote { path: PathBuf, previous_url: String },

    /// Nothing written because the document had no content
    SkippedEmpty,
}

impl WriteOutcome {
    /// The path written, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Written(path) | Self::Overwrote { path, .. } => Some(path),
            Self::SkippedEmpty => None,
        }
    }
}

/// Trait for document sinks
///
/// Sinks receive extracted documents one at a time, in completion order.
/// Implementations must be thread-safe.
pub trait DocumentSink: Send + Sync {
    /// Persists one document
    ///
    /// # Arguments
    ///
    /// * `doc` - The extracted document
    /// * `index` - Position of the document's URL in the discovery file, used
    ///   for placeholder names
    fn write(&self, doc: &ExtractedDocument, index: usize) -> OutputResult<WriteOutcome>;
}
