//! # JADB Storage
//!
//! Storage backends for JADB database files.
//!
//! A JADB database lives in exactly one file which is always read and
//! rewritten as a whole. Backends in this crate are **opaque whole-file
//! byte stores** - they do not interpret the JSON they hold.
//!
//! ## Design Principles
//!
//! - Backends store one blob: read it all, replace it all
//! - A replace either lands completely or not at all
//! - No knowledge of collections, documents or JSON
//! - Must be `Send + Sync` so handles can be shared across tasks
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral databases
//! - [`FileBackend`] - For persistent storage, replaced via temp file + rename
//!
//! ## Example
//!
//! ```rust
//! use jadb_storage::{InMemoryBackend, StorageBackend};
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let backend = InMemoryBackend::new();
//! backend.write(b"{}").await.unwrap();
//! assert_eq!(backend.read().await.unwrap(), b"{}");
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
