//! Storage module for persisting crawl data
//!
//! This module handles all file operations for the crawler, including:
//! - Raw document storage addressed by URL hash
//! - The append-only component record log
//! - Frontier and visited snapshots for resumption

mod files;
mod raw;
mod records;
mod snapshot;
mod traits;

pub use files::FileStorage;
pub use raw::{content_address, RawStore};
pub use records::{RecordLog, RECORDS_FILE};
pub use snapshot::{SnapshotStore, FRONTIER_FILE, VISITED_FILE};
pub use traits::{Storage, StorageError, StorageResult};

use crate::config::OutputConfig;
use crate::HarvestError;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Opens file storage rooted at the configured data directory
///
/// # Arguments
///
/// * `output` - Output configuration naming the data directory
///
/// # Returns
///
/// * `Ok(FileStorage)` - Directories exist and storage is ready
/// * `Err(HarvestError)` - A directory could not be created
pub fn open_storage(output: &OutputConfig) -> Result<FileStorage, HarvestError> {
    Ok(FileStorage::open(
        output.html_dir(),
        output.state_dir(),
        output.extracts_dir(),
    )?)
}

/// Persisted form of the crawl state
///
/// Both lists hold canonical URL strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlSnapshot {
    pub frontier: Vec<String>,
    pub visited: Vec<String>,
}

/// UI component summary of one page
///
/// Serialized as one JSON object per line in the record log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub url: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub headings: Vec<String>,

    #[serde(default)]
    pub buttons: Vec<String>,

    /// Texts of anchors whose target is an absolute https URL
    #[serde(default, rename = "links_sample")]
    pub links: Vec<String>,

    /// Non-empty image alt texts
    #[serde(default, rename = "imgs_alt_sample")]
    pub image_alts: Vec<String>,

    /// Most frequent class names with their counts
    #[serde(default)]
    pub top_classes: Vec<(String, usize)>,

    /// Text of card-like containers
    #[serde(default, rename = "possible_cards_sample")]
    pub cards: Vec<String>,
}

/// Writes `bytes` to `path` through a temporary sibling and a rename
///
/// Readers see either the old file or the complete new one. The parent directory is
/// synced after the rename so the new entry survives a power loss.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    let tmp_path = path.with_extension("tmp");

    let result = (|| -> std::io::Result<()> {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        std::fs::rename(&tmp_path, path)
    })();

    if let Err(e) = result {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(StorageError::io(path, e));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        sync_dir(parent).map_err(|e| StorageError::io(parent, e))?;
    }

    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

// Directories cannot be opened as files here
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}
