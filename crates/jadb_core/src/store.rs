//! A database file behind an in-process gate.

use crate::error::CoreResult;
use crate::file::DatabaseFile;
use jadb_storage::StorageBackend;
use std::path::Path;
use tokio::sync::{Mutex, MutexGuard};
use tracing::trace;

/// Contents written to a database file that does not exist yet.
pub(crate) const EMPTY_FILE: &[u8] = b"{}";

/// One database file shared by every handle that addresses it.
///
/// Each read-modify-write cycle holds the gate from load to persist, so
/// cycles issued through handles sharing this `DocumentFile` never
/// interleave. Other processes (or a second `DocumentFile` for the same
/// path) are not excluded: the last write wins.
#[derive(Debug)]
pub(crate) struct DocumentFile {
    backend: Box<dyn StorageBackend>,
    gate: Mutex<()>,
    indent: usize,
}

impl DocumentFile {
    pub(crate) fn new(backend: Box<dyn StorageBackend>, indent: usize) -> Self {
        Self {
            backend,
            gate: Mutex::new(()),
            indent,
        }
    }

    /// Filesystem location of the file, if it has one.
    pub(crate) fn path(&self) -> Option<&Path> {
        self.backend.path()
    }

    /// Returns whether the file exists.
    pub(crate) async fn exists(&self) -> CoreResult<bool> {
        Ok(self.backend.exists().await?)
    }

    /// Creates the file as `{}` if it is missing or empty.
    ///
    /// Returns `true` if the file was created.
    pub(crate) async fn bootstrap(&self) -> CoreResult<bool> {
        let _gate = self.gate.lock().await;
        Ok(self.backend.create_if_missing(EMPTY_FILE).await?)
    }

    /// Waits for exclusive use of the file.
    pub(crate) async fn lock(&self) -> FileGuard<'_> {
        FileGuard {
            file: self,
            _gate: self.gate.lock().await,
        }
    }
}

/// Exclusive access to a [`DocumentFile`] for one load-modify-persist cycle.
pub(crate) struct FileGuard<'a> {
    file: &'a DocumentFile,
    _gate: MutexGuard<'a, ()>,
}

impl FileGuard<'_> {
    /// Reads and parses the whole file.
    pub(crate) async fn load(&self) -> CoreResult<DatabaseFile> {
        let bytes = self.file.backend.read().await?;
        DatabaseFile::parse(&bytes)
    }

    /// Serializes and atomically replaces the whole file.
    pub(crate) async fn persist(&self, data: &DatabaseFile) -> CoreResult<()> {
        let bytes = data.to_bytes(self.file.indent)?;
        self.file.backend.write(&bytes).await?;
        trace!(bytes = bytes.len(), "persisted database file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use jadb_storage::InMemoryBackend;
    use std::sync::Arc;

    fn memory_file() -> DocumentFile {
        DocumentFile::new(Box::new(InMemoryBackend::new()), 4)
    }

    #[tokio::test]
    async fn bootstrap_creates_empty_mapping_once() {
        let file = memory_file();
        assert!(!file.exists().await.unwrap());

        assert!(file.bootstrap().await.unwrap());
        assert!(!file.bootstrap().await.unwrap());

        let guard = file.lock().await;
        assert_eq!(guard.load().await.unwrap(), DatabaseFile::new());
    }

    #[tokio::test]
    async fn load_before_bootstrap_fails() {
        let file = memory_file();
        let guard = file.lock().await;
        assert!(matches!(guard.load().await, Err(CoreError::Storage(_))));
    }

    #[tokio::test]
    async fn persist_then_load() {
        let file = memory_file();
        file.bootstrap().await.unwrap();

        let guard = file.lock().await;
        let mut data = guard.load().await.unwrap();
        data.ensure_collection("users");
        guard.persist(&data).await.unwrap();

        assert!(guard.load().await.unwrap().contains("users"));
    }

    #[tokio::test]
    async fn gate_serializes_cycles() {
        let file = Arc::new(memory_file());
        file.bootstrap().await.unwrap();

        let mut tasks = Vec::new();
        for i in 0..16 {
            let file = Arc::clone(&file);
            tasks.push(tokio::spawn(async move {
                let guard = file.lock().await;
                let mut data = guard.load().await.unwrap();
                tokio::task::yield_now().await;
                data.ensure_collection(&format!("c{i}"));
                guard.persist(&data).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let guard = file.lock().await;
        assert_eq!(guard.load().await.unwrap().collection_names().count(), 16);
    }
}
