//! Raw document store
//!
//! Each fetched HTML body is written to `<sha256 of canonical URL>.html`.

use crate::storage::traits::{StorageError, StorageResult};
use crate::storage::write_atomic;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use url::Url;

const RAW_EXTENSION: &str = "html";

/// Stable file stem for a canonical URL
pub fn content_address(url: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone)]
pub struct RawStore {
    dir: PathBuf,
}

impl RawStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, url: &Url) -> PathBuf {
        self.dir
            .join(format!("{}.{}", content_address(url), RAW_EXTENSION))
    }

    /// Writes the body, replacing any earlier copy of the same URL
    pub fn store(&self, url: &Url, body: &str) -> StorageResult<PathBuf> {
        let path = self.path_for(url);
        write_atomic(&path, body.as_bytes())?;
        Ok(path)
    }

    pub fn count(&self) -> StorageResult<usize> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(StorageError::io(&self.dir, e)),
        };

        let mut count = 0;
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(&self.dir, e))?;
            if entry.path().extension().and_then(|e| e.to_str()) == Some(RAW_EXTENSION) {
                count += 1;
            }
        }
        Ok(count)
    }
}
