//! JSON-lines discovery file
//!
//! Each line is a JSON object with a single `url` field. The file is truncated
//! when a sink is created, so a fresh crawl never mixes with older results.

use crate::storage::traits::{DiscoverySink, StorageError, StorageResult};
use crate::storage::DiscoveryRecord;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Discovery sink writing a JSON-lines file
#[derive(Debug)]
pub struct JsonlDiscoverySink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    count: AtomicUsize,
}

impl JsonlDiscoverySink {
    /// Creates (or truncates) the discovery file at `path`
    ///
    /// Parent directories are created as needed.
    pub fn create(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StorageError::Open {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|source| StorageError::Open {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(path = %path.display(), "Opened discovery file");

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
            count: AtomicUsize::new(0),
        })
    }

    /// Location of the discovery file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, BufWriter<File>> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DiscoverySink for JsonlDiscoverySink {
    fn record(&self, record: &DiscoveryRecord) -> StorageResult<()> {
        let line = serde_json::to_string(record)?;
        let mut writer = self.lock();
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        self.count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn flush(&self) -> StorageResult<()> {
        let mut writer = self.lock();
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    }

    fn len(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}

impl Drop for JsonlDiscoverySink {
    fn drop(&mut self) {
        if let Err(e) = self.lock().flush() {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to flush discovery file");
        }
    }
}

/// Reads the records of a discovery file
///
/// Blank lines are ignored; lines that are not valid records are skipped with
/// a warning rather than failing the whole file.
pub fn read_discovery_file(path: impl AsRef<Path>) -> StorageResult<Vec<DiscoveryRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| StorageError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<DiscoveryRecord>(trimmed) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    line = index + 1,
                    error = %e,
                    "Skipping invalid discovery line"
                );
            }
        }
    }

    Ok(records)
}
