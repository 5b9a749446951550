//! Frontier and visited snapshot files
//!
//! Two JSON arrays of canonical URL strings live in the state directory. Each file is
//! replaced atomically; visited is always written before frontier.

use crate::storage::traits::{StorageError, StorageResult};
use crate::storage::{write_atomic, CrawlSnapshot};
use std::path::{Path, PathBuf};

pub const FRONTIER_FILE: &str = "frontier.json";
pub const VISITED_FILE: &str = "visited.json";

/// Reads and writes crawl state snapshots
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    state_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    pub fn frontier_path(&self) -> PathBuf {
        self.state_dir.join(FRONTIER_FILE)
    }

    pub fn visited_path(&self) -> PathBuf {
        self.state_dir.join(VISITED_FILE)
    }

    /// Returns true if neither snapshot file exists
    pub fn is_empty(&self) -> bool {
        !self.frontier_path().exists() && !self.visited_path().exists()
    }

    /// Loads the snapshot; a missing file reads as an empty list
    pub fn load(&self) -> StorageResult<Option<CrawlSnapshot>> {
        if self.is_empty() {
            return Ok(None);
        }

        let frontier = read_url_list(&self.frontier_path())?;
        let visited = read_url_list(&self.visited_path())?;

        Ok(Some(CrawlSnapshot { frontier, visited }))
    }

    /// Writes visited then frontier, each via temp file and rename
    ///
    /// If the process dies between the two renames the new visited set is paired with
    /// the old frontier: some pending URLs may be lost but none is fetched twice.
    pub fn save(&self, snapshot: &CrawlSnapshot) -> StorageResult<()> {
        std::fs::create_dir_all(&self.state_dir)
            .map_err(|e| StorageError::io(&self.state_dir, e))?;

        write_url_list(&self.visited_path(), &snapshot.visited)?;
        write_url_list(&self.frontier_path(), &snapshot.frontier)?;

        tracing::debug!(
            "Checkpointed {} pending / {} visited URLs to {}",
            snapshot.frontier.len(),
            snapshot.visited.len(),
            self.state_dir.display()
        );
        Ok(())
    }
}

fn read_url_list(path: &Path) -> StorageResult<Vec<String>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StorageError::io(path, e)),
    };

    serde_json::from_str(&content).map_err(|source| StorageError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn write_url_list(path: &Path, urls: &[String]) -> StorageResult<()> {
    let json = serde_json::to_vec_pretty(urls).map_err(|source| StorageError::Serialization {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomic(path, &json)
}
