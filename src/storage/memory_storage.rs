use std::sync::Mutex;

use log::debug;

use crate::error_handling::types::StorageError;
use crate::storage::storage_trait::HistoryStorage;
use crate::storage::types::HistoryLog;

/// Volatile backend: the log lives only as long as the process.
#[derive(Default)]
pub struct MemoryHistoryStorage {
    log: Mutex<HistoryLog>,
}

impl MemoryHistoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStorage for MemoryHistoryStorage {
    fn read_all(&self) -> Result<HistoryLog, StorageError> {
        let log = self.log.lock().map_err(|_| StorageError::Unavailable)?;
        Ok(log.clone())
    }

    fn replace_all(&self, log: &HistoryLog) -> Result<usize, StorageError> {
        let mut current = self.log.lock().map_err(|_| StorageError::Unavailable)?;
        *current = log.clone();
        debug!("Replaced in-memory history with {} record(s)", log.len());
        Ok(log.len())
    }
}
