//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{ComponentRecord, CrawlSnapshot};
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// Errors that can occur during storage operations
///
/// Every variant carries the path that failed so fatal errors can be reported precisely.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize data for {}: {source}", .path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Corrupt state file {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The file or directory the error refers to
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Io { path, .. } | Self::Serialization { path, .. } | Self::Corrupt { path, .. } => {
                path
            }
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait covers everything the crawler persists: the crawl state snapshot, the
/// raw document store and the component record log.
pub trait Storage {
    // ===== Crawl State =====

    /// Loads the most recent snapshot, or `None` if no snapshot was ever written
    fn load_snapshot(&self) -> StorageResult<Option<CrawlSnapshot>>;

    /// Durably replaces the snapshot
    ///
    /// A crash during this call leaves either the previous or the new snapshot on disk,
    /// never a torn file.
    fn checkpoint(&mut self, snapshot: &CrawlSnapshot) -> StorageResult<()>;

    /// Returns true if no snapshot exists
    fn is_empty_state(&self) -> bool;

    // ===== Raw Documents =====

    /// Writes a raw document under its content address and returns the path
    ///
    /// Storing the same URL again overwrites the same file.
    fn store_raw(&mut self, url: &Url, body: &str) -> StorageResult<PathBuf>;

    /// Counts stored raw documents
    fn count_raw_documents(&self) -> StorageResult<usize>;

    // ===== Record Log =====

    /// Appends one record as a single durable line
    fn append_record(&mut self, record: &ComponentRecord) -> StorageResult<()>;

    /// Reads every complete record from the log
    fn read_records(&self) -> StorageResult<Vec<ComponentRecord>>;
}
