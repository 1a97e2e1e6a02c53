//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The backing file (or in-memory blob) does not exist yet.
    #[error("storage not found: {}", path.display())]
    NotFound {
        /// Location that was read.
        path: PathBuf,
    },
}

impl StorageError {
    /// Maps an I/O error on `path`, turning `NotFound` into [`StorageError::NotFound`].
    pub(crate) fn from_io(err: io::Error, path: &std::path::Path) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io(err)
        }
    }
}
