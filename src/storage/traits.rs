//! Discovery sink trait and error types
//!
//! A discovery sink is the durable handoff between the crawl phase and the
//! extraction phase: one record per confirmed in-scope URL.

use crate::storage::DiscoveryRecord;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing or reading discovery records
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to open discovery file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Append-only destination for discovery records
///
/// Implementations must be safe to share between crawl workers. Duplicate
/// suppression is the frontier's job, not the sink's.
pub trait DiscoverySink: Send + Sync {
    /// Appends one record
    fn record(&self, record: &DiscoveryRecord) -> StorageResult<()>;

    /// Makes every record written so far durable
    fn flush(&self) -> StorageResult<()>;

    /// Number of records written
    fn len(&self) -> usize;

    /// Returns true if nothing has been written
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
