//! Storage subsystem
//!
//! This module persists the comparison history as a single ordered log.
//!
//! Components:
//! - `storage_trait`: the HistoryStorage trait (read, atomic replace, derived append/clear).
//! - `types`: the `HistoryLog` type and payload validation.
//! - `file_storage`: JSON document on disk, replaced atomically through a temp file.
//! - `memory_storage`: in-process backend for tests and throwaway runs.

pub mod file_storage;
pub mod memory_storage;
pub mod storage_trait;
pub mod types;

pub use file_storage::FileHistoryStorage;
pub use memory_storage::MemoryHistoryStorage;
pub use storage_trait::HistoryStorage;
pub use types::HistoryLog;
