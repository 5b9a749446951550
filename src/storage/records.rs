//! Append-only component record log
//!
//! One JSON object per line. Each append is flushed and synced before returning, so a
//! crash can at worst leave a torn final line. Readers skip it, and the next writer
//! terminates it before appending.

use crate::storage::traits::{StorageError, StorageResult};
use crate::storage::ComponentRecord;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub const RECORDS_FILE: &str = "components.jsonl";

#[derive(Debug)]
pub struct RecordLog {
    path: PathBuf,
    /// Opened on first append
    file: Option<File>,
}

impl RecordLog {
    pub fn new(extracts_dir: &Path) -> Self {
        Self {
            path: extracts_dir.join(RECORDS_FILE),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record as a complete line and syncs it to disk
    pub fn append(&mut self, record: &ComponentRecord) -> StorageResult<()> {
        let mut line =
            serde_json::to_vec(record).map_err(|source| StorageError::Serialization {
                path: self.path.clone(),
                source,
            })?;
        line.push(b'\n');

        let path = self.path.clone();
        let file = self.open()?;
        file.write_all(&line)
            .and_then(|_| file.sync_data())
            .map_err(|e| StorageError::io(path, e))
    }

    /// Reads all parseable records in log order
    pub fn read_all(&self) -> StorageResult<Vec<ComponentRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };

        let mut records = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| StorageError::io(&self.path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ComponentRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(
                    "Skipping unreadable record at {}:{}: {}",
                    self.path.display(),
                    index + 1,
                    e
                ),
            }
        }
        Ok(records)
    }

    fn open(&mut self) -> StorageResult<&mut File> {
        let file = match self.file.take() {
            Some(file) => file,
            None => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .read(true)
                    .append(true)
                    .open(&self.path)
                    .map_err(|e| StorageError::io(&self.path, e))?;
                terminate_torn_line(&mut file).map_err(|e| StorageError::io(&self.path, e))?;
                file
            }
        };
        Ok(self.file.insert(file))
    }
}

/// Ends an unterminated final line so the next record starts on its own line
fn terminate_torn_line(file: &mut File) -> std::io::Result<()> {
    if file.metadata()?.len() == 0 {
        return Ok(());
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;

    if last[0] != b'\n' {
        tracing::warn!("Record log ends with a partial line, starting a new one");
        file.write_all(b"\n")?;
        file.sync_data()?;
    }
    Ok(())
}
