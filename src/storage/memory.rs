//! In-memory discovery sink

use crate::storage::traits::{DiscoverySink, StorageResult};
use crate::storage::DiscoveryRecord;
use std::sync::{Mutex, PoisonError};

/// Discovery sink that keeps records in memory
///
/// Used by dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryDiscoverySink {
    records: Mutex<Vec<DiscoveryRecord>>,
}

impl MemoryDiscoverySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the records written so far
    pub fn records(&self) -> Vec<DiscoveryRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DiscoverySink for MemoryDiscoverySink {
    fn record(&self, record: &DiscoveryRecord) -> StorageResult<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    fn flush(&self) -> StorageResult<()> {
        Ok(())
    }

    fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
