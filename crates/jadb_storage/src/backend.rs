//! Storage backend trait definition.

use crate::error::StorageResult;
use async_trait::async_trait;
use std::fmt;
use std::path::Path;

/// A whole-file storage backend for JADB.
///
/// Storage backends are **opaque byte stores** holding a single blob. JADB
/// owns the JSON format - backends never parse what they store.
///
/// # Invariants
///
/// - `read` returns exactly the bytes of the last successful `write`
/// - `write` replaces the blob atomically: a failed write leaves the
///   previous contents intact
/// - Backends must be `Send + Sync` so one handle can serve many tasks
///
/// Backends do not serialize concurrent callers. Two overlapping
/// read-modify-write cycles race and the last `write` wins.
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
#[async_trait]
pub trait StorageBackend: Send + Sync + fmt::Debug {
    /// Reads the entire blob.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::NotFound`] if nothing has been stored
    /// yet, or an I/O error if the read fails.
    async fn read(&self) -> StorageResult<Vec<u8>>;

    /// Replaces the entire blob with `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails. The previous contents are
    /// preserved in that case.
    async fn write(&self, data: &[u8]) -> StorageResult<()>;

    /// Returns whether a blob has been stored.
    ///
    /// # Errors
    ///
    /// Returns an error if existence cannot be determined.
    async fn exists(&self) -> StorageResult<bool>;

    /// Writes `initial` if the blob is missing or empty.
    ///
    /// Returns `true` if `initial` was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the check or the write fails.
    async fn create_if_missing(&self, initial: &[u8]) -> StorageResult<bool>;

    /// Returns the filesystem location, if this backend has one.
    fn path(&self) -> Option<&Path> {
        None
    }
}
