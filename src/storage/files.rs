//! File-backed storage implementation
//!
//! This module provides the directory-based implementation of the Storage trait.

use crate::storage::raw::RawStore;
use crate::storage::records::RecordLog;
use crate::storage::snapshot::SnapshotStore;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{ComponentRecord, CrawlSnapshot};
use std::path::{Path, PathBuf};
use url::Url;

/// Storage rooted at three directories: raw HTML, state snapshots and extracts
#[derive(Debug)]
pub struct FileStorage {
    raw: RawStore,
    snapshots: SnapshotStore,
    records: RecordLog,
}

impl FileStorage {
    /// Opens storage, creating the directories if needed
    ///
    /// # Arguments
    ///
    /// * `html_dir` - Where raw documents are written
    /// * `state_dir` - Where frontier and visited snapshots live
    /// * `extracts_dir` - Where the record log lives
    pub fn open(
        html_dir: impl Into<PathBuf>,
        state_dir: impl Into<PathBuf>,
        extracts_dir: impl Into<PathBuf>,
    ) -> StorageResult<Self> {
        let html_dir = html_dir.into();
        let state_dir = state_dir.into();
        let extracts_dir = extracts_dir.into();

        for dir in [&html_dir, &state_dir, &extracts_dir] {
            create_dir(dir)?;
        }

        Ok(Self {
            raw: RawStore::new(html_dir),
            snapshots: SnapshotStore::new(state_dir),
            records: RecordLog::new(&extracts_dir),
        })
    }

    pub fn raw_path_for(&self, url: &Url) -> PathBuf {
        self.raw.path_for(url)
    }

    pub fn records_path(&self) -> &Path {
        self.records.path()
    }

    pub fn frontier_path(&self) -> PathBuf {
        self.snapshots.frontier_path()
    }

    pub fn visited_path(&self) -> PathBuf {
        self.snapshots.visited_path()
    }
}

fn create_dir(dir: &Path) -> StorageResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))
}

impl Storage for FileStorage {
    // ===== Crawl State =====

    fn load_snapshot(&self) -> StorageResult<Option<CrawlSnapshot>> {
        self.snapshots.load()
    }

    fn checkpoint(&mut self, snapshot: &CrawlSnapshot) -> StorageResult<()> {
        self.snapshots.save(snapshot)
    }

    fn is_empty_state(&self) -> bool {
        self.snapshots.is_empty()
    }

    // ===== Raw Documents =====

    fn store_raw(&mut self, url: &Url, body: &str) -> StorageResult<PathBuf> {
        self.raw.store(url, body)
    }

    fn count_raw_documents(&self) -> StorageResult<usize> {
        self.raw.count()
    }

    // ===== Record Log =====

    fn append_record(&mut self, record: &ComponentRecord) -> StorageResult<()> {
        self.records.append(record)
    }

    fn read_records(&self) -> StorageResult<Vec<ComponentRecord>> {
        self.records.read_all()
    }
}
