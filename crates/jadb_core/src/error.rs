//! Error types for JADB core.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in JADB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] jadb_storage::StorageError),

    /// JSON parse or conversion error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The database file parsed as JSON but does not have the expected shape.
    #[error("malformed database file: {message}")]
    MalformedFile {
        /// Description of the problem.
        message: String,
    },

    /// An operation that needs a target received an empty query.
    #[error("invalid query: {operation} requires a non-empty query")]
    InvalidQuery {
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// Fields supplied for a document were rejected.
    #[error("invalid document: {message}")]
    InvalidDocument {
        /// Why the fields were rejected.
        message: String,
    },

    /// A database or collection name was rejected.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The collection key is missing from the database file.
    #[error("collection not found: {name}")]
    CollectionNotFound {
        /// Name of the collection.
        name: String,
    },

    /// The database does not exist and creation is disabled.
    #[error("database not found: {}", path.display())]
    DatabaseNotFound {
        /// Expected location of the database file.
        path: PathBuf,
    },
}

impl CoreError {
    /// Creates a malformed file error.
    pub fn malformed_file(message: impl Into<String>) -> Self {
        Self::MalformedFile {
            message: message.into(),
        }
    }

    /// Creates an invalid query error for `operation`.
    pub fn invalid_query(operation: &'static str) -> Self {
        Self::InvalidQuery { operation }
    }

    /// Creates an invalid document error.
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    /// Creates an invalid name error.
    pub fn invalid_name(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason,
        }
    }

    /// Returns true if the caller passed bad input, as opposed to an
    /// environment or data failure.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidQuery { .. }
                | CoreError::InvalidDocument { .. }
                | CoreError::InvalidName { .. }
        )
    }
}
