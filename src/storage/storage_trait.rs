//! History Storage Trait
//!
//! This module defines the `HistoryStorage` trait, the persistence contract for
//! the comparison history.
//!
//! Implementors only provide the two primitives:
//! - `read_all`: the whole persisted log, empty when nothing was ever stored
//! - `replace_all`: an atomic overwrite of the whole log
//!
//! Appending and clearing are derived from those two. There is no locking
//! between a read and the following replace: a single writer is assumed and
//! the last write wins.

use log::{debug, warn};

use crate::dispatch::types::ComparisonResult;
use crate::error_handling::types::StorageError;
use crate::storage::types::HistoryLog;

pub trait HistoryStorage: Send + Sync {
    /// Returns the persisted log, or an empty log if none was ever written.
    fn read_all(&self) -> Result<HistoryLog, StorageError>;

    /// Replaces the persisted log with `log` and returns the stored count.
    ///
    /// Either the new log is fully stored or the previous one is left intact.
    fn replace_all(&self, log: &HistoryLog) -> Result<usize, StorageError>;

    /// Prepends `record` to the stored log and persists the result.
    ///
    /// An unreadable log counts as empty and is replaced.
    fn append(&self, record: ComparisonResult) -> Result<HistoryLog, StorageError> {
        let current = match self.read_all() {
            Ok(log) => log,
            Err(StorageError::ReadFailed) => {
                warn!("Stored history is unreadable, starting a new log");
                HistoryLog::new()
            }
            Err(e) => return Err(e),
        };
        let updated = current.prepended(record);
        self.replace_all(&updated)?;
        debug!("History now holds {} record(s)", updated.len());
        Ok(updated)
    }

    /// Replaces the stored log with an empty one.
    fn clear(&self) -> Result<(), StorageError> {
        self.replace_all(&HistoryLog::new()).map(|_| ())
    }
}
