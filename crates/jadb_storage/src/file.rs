//! File-based storage backend for persistent storage.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::Builder;
use tokio::{fs, task};
use tracing::trace;

/// Suffix of in-flight temporary files.
const TEMP_SUFFIX: &str = ".tmp";

/// A file-based storage backend.
///
/// The whole blob lives in one file. Writes never modify that file in
/// place: data goes to a uniquely named temporary file in the same
/// directory which is then renamed over the target, so readers see either
/// the old or the new contents. Concurrent writers each get their own
/// temporary file; the last rename wins.
///
/// # Durability
///
/// - With `sync_on_write` (the default) the temporary file is fsynced
///   before the rename
/// - The rename itself relies on the filesystem's atomic replace
///
/// # Example
///
/// ```no_run
/// use jadb_storage::{FileBackend, StorageBackend};
///
/// # async fn demo() -> jadb_storage::StorageResult<()> {
/// let backend = FileBackend::new("data/app.db.json");
/// backend.create_if_missing(b"{}").await?;
/// backend.write(b"{\"users\": []}").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
    sync_on_write: bool,
}

impl FileBackend {
    /// Creates a backend for the file at `path`.
    ///
    /// Nothing is touched on disk until the first operation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sync_on_write: true,
        }
    }

    /// Sets whether the temporary file is fsynced before it replaces the target.
    #[must_use]
    pub fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.path
    }

    /// Writes `data` to a fresh temporary file and moves it into place.
    ///
    /// With `overwrite` off an existing target is left alone and `false`
    /// is returned.
    async fn replace(&self, data: &[u8], overwrite: bool) -> StorageResult<bool> {
        let path = self.path.clone();
        let bytes = data.len();
        let data = data.to_vec();
        let sync = self.sync_on_write;
        let replaced = task::spawn_blocking(move || replace_file(&path, &data, sync, overwrite))
            .await
            .map_err(io::Error::other)??;
        if replaced {
            trace!(path = %self.path.display(), bytes, "replaced file");
        }
        Ok(replaced)
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn read(&self) -> StorageResult<Vec<u8>> {
        fs::read(&self.path)
            .await
            .map_err(|err| StorageError::from_io(err, &self.path))
    }

    async fn write(&self, data: &[u8]) -> StorageResult<()> {
        self.replace(data, true).await?;
        Ok(())
    }

    async fn exists(&self) -> StorageResult<bool> {
        Ok(fs::try_exists(&self.path).await?)
    }

    async fn create_if_missing(&self, initial: &[u8]) -> StorageResult<bool> {
        match fs::metadata(&self.path).await {
            Ok(meta) if meta.len() > 0 => Ok(false),
            Ok(_) => self.replace(initial, true).await,
            // Another writer may create the file first; theirs is kept.
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.replace(initial, false).await
            }
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// Blocking half of [`FileBackend::replace`].
///
/// The temporary file is deleted when it is dropped, so every error path
/// cleans up after itself.
fn replace_file(path: &Path, data: &[u8], sync: bool, overwrite: bool) -> io::Result<bool> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut temp = Builder::new()
        .prefix(&temp_prefix(path))
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)?;
    temp.write_all(data)?;
    temp.flush()?;
    if sync {
        temp.as_file().sync_all()?;
    }

    let persisted = if overwrite {
        temp.persist(path)
    } else {
        temp.persist_noclobber(path)
    };
    match persisted {
        Ok(_) => Ok(true),
        Err(err) if !overwrite && err.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(err) => Err(err.error),
    }
}

/// `.<file name>.` so temporary files sort next to their target.
fn temp_prefix(path: &Path) -> OsString {
    let mut prefix = OsString::from(".");
    if let Some(name) = path.file_name() {
        prefix.push(name);
    }
    prefix.push(".");
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn file_read_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("missing.json"));

        let result = backend.read().await;
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
        assert!(!backend.exists().await.unwrap());
    }

    #[tokio::test]
    async fn file_write_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.json");
        let backend = FileBackend::new(&path);

        backend.write(b"hello").await.unwrap();
        assert_eq!(backend.read().await.unwrap(), b"hello");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn file_write_replaces_contents() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("test.json"));

        backend.write(b"a much longer first value").await.unwrap();
        backend.write(b"short").await.unwrap();

        assert_eq!(backend.read().await.unwrap(), b"short");
    }

    #[tokio::test]
    async fn file_write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.json");
        let backend = FileBackend::new(&path);

        backend.write(b"data").await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("test.json")]);
    }

    #[tokio::test]
    async fn file_failed_rename_cleans_up_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.json");
        // A non-empty directory squatting on the target makes the rename fail.
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();
        let backend = FileBackend::new(&path);

        assert!(matches!(
            backend.write(b"replacement").await,
            Err(StorageError::Io(_))
        ));

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("test.json")]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_never_expose_partial_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shared.json");
        FileBackend::new(&path).write(&[b'-'; 4096]).await.unwrap();

        let mut tasks = Vec::new();
        for fill in [b'a', b'b', b'c', b'd'] {
            // Separate backends share nothing but the path.
            let backend = FileBackend::new(&path).sync_on_write(false);
            tasks.push(tokio::spawn(async move {
                let value = vec![fill; 4096];
                for _ in 0..50 {
                    backend.write(&value).await.unwrap();
                    let read = backend.read().await.unwrap();
                    assert_eq!(read.len(), 4096);
                    assert!(read.iter().all(|b| *b == read[0]));
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("shared.json")]);
    }

    #[tokio::test]
    async fn file_create_if_missing() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("test.json"));

        assert!(backend.create_if_missing(b"{}").await.unwrap());
        assert!(!backend.create_if_missing(b"[]").await.unwrap());
        assert_eq!(backend.read().await.unwrap(), b"{}");
    }

    #[tokio::test]
    async fn file_create_if_missing_fills_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.json");
        std::fs::write(&path, b"").unwrap();
        let backend = FileBackend::new(&path);

        assert!(backend.create_if_missing(b"{}").await.unwrap());
        assert_eq!(backend.read().await.unwrap(), b"{}");
    }

    #[tokio::test]
    async fn file_write_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("nested").join("test.json"));

        assert!(matches!(
            backend.write(b"{}").await,
            Err(StorageError::Io(_))
        ));
    }

    #[tokio::test]
    async fn create_if_missing_keeps_file_created_concurrently() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.json");
        let backend = FileBackend::new(&path);
        std::fs::write(&path, b"{\"users\": []}").unwrap();

        // The target appeared after the existence check.
        assert!(!backend.replace(b"{}", false).await.unwrap());
        assert_eq!(backend.read().await.unwrap(), b"{\"users\": []}");
    }

    #[test]
    fn temp_prefix_names_the_target() {
        assert_eq!(
            temp_prefix(Path::new("/data/app.db.json")),
            OsString::from(".app.db.json.")
        );
    }

    #[test]
    fn file_path() {
        let backend = FileBackend::new("/data/app.db.json");
        assert_eq!(backend.file_path(), Path::new("/data/app.db.json"));
        assert_eq!(
            StorageBackend::path(&backend),
            Some(Path::new("/data/app.db.json"))
        );
    }
}
