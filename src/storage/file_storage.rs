use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, error, info};
use tempfile::NamedTempFile;

use crate::error_handling::types::StorageError;
use crate::storage::storage_trait::HistoryStorage;
use crate::storage::types::HistoryLog;

/// Default name of the single history document.
pub const DEFAULT_HISTORY_FILE: &str = "history.json";

/// Keeps the whole history as one pretty-printed JSON document.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the document, so a reader sees either the old or the new log.
pub struct FileHistoryStorage {
    base_path: PathBuf,
    file_name: String,
}

impl FileHistoryStorage {
    /// The directory is created lazily on the first write.
    pub fn new<P: AsRef<Path>>(base_path: P, file_name: &str) -> Self {
        let base_path = base_path.as_ref().to_path_buf();
        info!(
            "FileHistoryStorage using {}",
            base_path.join(file_name).display()
        );
        Self {
            base_path,
            file_name: file_name.to_string(),
        }
    }

    pub fn history_path(&self) -> PathBuf {
        self.base_path.join(&self.file_name)
    }
}

impl HistoryStorage for FileHistoryStorage {
    fn read_all(&self) -> Result<HistoryLog, StorageError> {
        let path = self.history_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No history file at {}, starting empty", path.display());
                return Ok(HistoryLog::new());
            }
            Err(e) => {
                error!("Failed to read history file {}: {}", path.display(), e);
                return Err(StorageError::ReadFailed);
            }
        };
        let log: HistoryLog = serde_json::from_str(&content).map_err(|e| {
            error!("History file {} is not a valid log: {}", path.display(), e);
            StorageError::ReadFailed
        })?;
        debug!("Read {} record(s) from {}", log.len(), path.display());
        Ok(log)
    }

    fn replace_all(&self, log: &HistoryLog) -> Result<usize, StorageError> {
        let path = self.history_path();
        fs::create_dir_all(&self.base_path).map_err(|e| {
            error!("Failed to create history dir {}: {}", self.base_path.display(), e);
            StorageError::WriteFailed
        })?;

        let encoded = serde_json::to_vec_pretty(log).map_err(|e| {
            error!("Failed to encode history: {}", e);
            StorageError::WriteFailed
        })?;

        // the temp file is removed on drop if anything below fails
        let mut tmp = NamedTempFile::new_in(&self.base_path).map_err(|e| {
            error!("Failed to create temp file in {}: {}", self.base_path.display(), e);
            StorageError::WriteFailed
        })?;
        tmp.write_all(&encoded).map_err(|e| {
            error!("Failed to write temp history file: {}", e);
            StorageError::WriteFailed
        })?;
        tmp.as_file().sync_all().map_err(|e| {
            error!("Failed to sync temp history file: {}", e);
            StorageError::WriteFailed
        })?;
        tmp.persist(&path).map_err(|e| {
            error!("Failed to move history into {}: {}", path.display(), e.error);
            StorageError::WriteFailed
        })?;

        info!("Saved {} item(s) to {}", log.len(), path.display());
        Ok(log.len())
    }
}
