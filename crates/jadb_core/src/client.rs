//! Client and storage bootstrap.
//!
//! The client maps database names to files inside one storage directory:
//!
//! ```text
//! <root>/
//! ├─ app.db.json        # database "app"
//! └─ analytics.db.json  # database "analytics"
//! ```
//!
//! Opening a database creates the directory and an empty `{}` file when
//! they are missing.

use crate::config::Config;
use crate::database::Database;
use crate::error::{CoreError, CoreResult};
use crate::store::DocumentFile;
use jadb_storage::{FileBackend, InMemoryBackend, StorageBackend};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

/// Where a client keeps its databases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backing {
    Disk,
    Memory,
}

/// Entry point for opening databases.
///
/// A client owns one [`DocumentFile`] per database file. Every
/// [`Database`] and collection handle obtained through the same client
/// shares it, so their read-modify-write cycles never interleave. Two
/// clients (or two processes) using the same directory are not
/// coordinated.
///
/// # Example
///
/// ```rust,no_run
/// use jadb_core::Client;
/// use serde_json::json;
///
/// # async fn demo() -> jadb_core::CoreResult<()> {
/// let client = Client::open("data");
/// let db = client.database("app").await?; // data/app.db.json
/// let users = db.collection("users").await?;
/// users.insert_one(json!({"name": "alice"})).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Client {
    config: Config,
    backing: Backing,
    files: Mutex<HashMap<PathBuf, Arc<DocumentFile>>>,
}

impl Client {
    /// Creates a client storing databases under `root` with default settings.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self::with_config(Config::new(root))
    }

    /// Creates a client with custom configuration.
    ///
    /// ```rust
    /// use jadb_core::{Client, Config};
    ///
    /// let config = Config::new("data")
    ///     .create_if_missing(false)
    ///     .sync_on_write(false);
    /// let client = Client::with_config(config);
    /// assert_eq!(client.config().file_name("app"), "app.db.json");
    /// ```
    pub fn with_config(config: Config) -> Self {
        Self::new(config, Backing::Disk)
    }

    /// Creates a client whose databases live only in memory.
    ///
    /// Each database name maps to its own in-memory file, shared by all
    /// handles from this client. The client keeps every file it opened, so
    /// data lives until the client and all of its handles are dropped.
    /// No filesystem path is ever resolved.
    pub fn in_memory() -> Self {
        Self::in_memory_with_config(Config::default())
    }

    /// Creates an in-memory client using the clock, id generator and
    /// formatting settings of `config`.
    pub fn in_memory_with_config(config: Config) -> Self {
        Self::new(config, Backing::Memory)
    }

    fn new(config: Config, backing: Backing) -> Self {
        Self {
            config,
            backing,
            files: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the storage directory, resolved against the current
    /// working directory when relative.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn root(&self) -> CoreResult<PathBuf> {
        if self.config.root.is_absolute() {
            Ok(self.config.root.clone())
        } else {
            Ok(std::env::current_dir()?.join(&self.config.root))
        }
    }

    /// Returns the file path that database `name` lives in.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidName`] if `name` cannot be used as a
    /// file name.
    pub fn database_path(&self, name: &str) -> CoreResult<PathBuf> {
        validate_database_name(name)?;
        Ok(self.root()?.join(self.config.file_name(name)))
    }

    /// Opens database `name`, creating its directory and file if needed.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [`CoreError::InvalidName`] if `name` is empty or contains a path separator
    /// - [`CoreError::DatabaseNotFound`] if the file is missing and
    ///   `create_if_missing` is off
    /// - an I/O or storage error if bootstrap fails
    pub async fn database(&self, name: &str) -> CoreResult<Database> {
        let path = match self.backing {
            Backing::Disk => {
                let path = self.database_path(name)?;
                self.prepare_directory(&path).await?;
                path
            }
            Backing::Memory => {
                validate_database_name(name)?;
                PathBuf::from(self.config.file_name(name))
            }
        };

        let file = self.file_for(&path);
        if !self.config.create_if_missing && !file.exists().await? {
            return Err(CoreError::DatabaseNotFound { path });
        }
        if file.bootstrap().await? {
            debug!(database = name, path = %path.display(), "created database file");
        }

        Ok(Database::new(
            name.to_owned(),
            file,
            Arc::clone(&self.config.clock),
            Arc::clone(&self.config.ids),
        ))
    }

    async fn prepare_directory(&self, path: &Path) -> CoreResult<()> {
        let Some(dir) = path.parent() else {
            return Ok(());
        };
        if fs::try_exists(dir).await? {
            return Ok(());
        }
        if !self.config.create_if_missing {
            return Err(CoreError::DatabaseNotFound {
                path: path.to_path_buf(),
            });
        }
        fs::create_dir_all(dir).await?;
        debug!(path = %dir.display(), "created storage directory");
        Ok(())
    }

    fn file_for(&self, path: &Path) -> Arc<DocumentFile> {
        let mut files = self.files.lock();
        let file = files.entry(path.to_path_buf()).or_insert_with(|| {
            let backend: Box<dyn StorageBackend> = match self.backing {
                Backing::Disk => {
                    Box::new(FileBackend::new(path).sync_on_write(self.config.sync_on_write))
                }
                Backing::Memory => Box::new(InMemoryBackend::new()),
            };
            Arc::new(DocumentFile::new(backend, self.config.indent))
        });
        Arc::clone(file)
    }
}

fn validate_database_name(name: &str) -> CoreResult<()> {
    if name.is_empty() {
        return Err(CoreError::invalid_name(name, "database name must not be empty"));
    }
    if name == "." || name == ".." {
        return Err(CoreError::invalid_name(name, "database name must not be . or .."));
    }
    if name.contains(['/', '\\']) {
        return Err(CoreError::invalid_name(
            name,
            "database name must not contain path separators",
        ));
    }
    Ok(())
}
