//! In-memory storage backend for testing.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::path::PathBuf;

/// An in-memory storage backend.
///
/// This backend keeps the blob in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral databases that don't need persistence
///
/// A fresh backend holds nothing, so `read` reports
/// [`StorageError::NotFound`] until the first `write`.
///
/// # Example
///
/// ```rust
/// use jadb_storage::{InMemoryBackend, StorageBackend};
///
/// # let rt = tokio::runtime::Runtime::new().unwrap();
/// # rt.block_on(async {
/// let backend = InMemoryBackend::new();
/// assert!(backend.create_if_missing(b"{}").await.unwrap());
/// assert_eq!(backend.data(), Some(b"{}".to_vec()));
/// # });
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    data: RwLock<Option<Vec<u8>>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory backend with pre-existing data.
    ///
    /// Useful for testing how malformed contents are handled.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(Some(data)),
        }
    }

    /// Returns a copy of the stored blob.
    #[must_use]
    pub fn data(&self) -> Option<Vec<u8>> {
        self.data.read().clone()
    }

    /// Discards the stored blob.
    pub fn clear(&self) {
        *self.data.write() = None;
    }
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    async fn read(&self) -> StorageResult<Vec<u8>> {
        self.data
            .read()
            .clone()
            .ok_or_else(|| StorageError::NotFound {
                path: PathBuf::from(":memory:"),
            })
    }

    async fn write(&self, data: &[u8]) -> StorageResult<()> {
        *self.data.write() = Some(data.to_vec());
        Ok(())
    }

    async fn exists(&self) -> StorageResult<bool> {
        Ok(self.data.read().is_some())
    }

    async fn create_if_missing(&self, initial: &[u8]) -> StorageResult<bool> {
        let mut data = self.data.write();
        match data.as_ref() {
            Some(existing) if !existing.is_empty() => Ok(false),
            _ => {
                *data = Some(initial.to_vec());
                Ok(true)
            }
        }
    }
}
