//! Database handle.

use crate::clock::Clock;
use crate::collection::{Collection, TypedCollection};
use crate::error::{CoreError, CoreResult};
use crate::id::IdGenerator;
use crate::store::DocumentFile;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A handle to one database file.
///
/// `Database` makes sure collections exist and hands out [`Collection`]
/// handles bound to its file. Handles are cheap to clone; clones share
/// the same file and gate.
///
/// # Example
///
/// ```rust
/// use jadb_core::Client;
///
/// # let rt = tokio::runtime::Runtime::new().unwrap();
/// # rt.block_on(async {
/// let client = Client::in_memory();
/// let db = client.database("app").await?;
///
/// let users = db.collection("users").await?;
/// assert_eq!(users.name(), "users");
/// assert_eq!(db.collection_names().await?, vec!["users".to_string()]);
/// # Ok::<(), jadb_core::CoreError>(())
/// # }).unwrap();
/// ```
#[derive(Clone)]
pub struct Database {
    name: String,
    file: Arc<DocumentFile>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl Database {
    pub(crate) fn new(
        name: String,
        file: Arc<DocumentFile>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            name,
            file,
            clock,
            ids,
        }
    }

    /// Returns the database name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the path of the backing file, if it lives on disk.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.file.path()
    }

    /// Returns a handle to collection `name`, creating it empty if absent.
    ///
    /// Creating a collection writes the file immediately. Calling this
    /// again for an existing collection only returns a new handle.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidName`] for an empty name, or an error if
    /// the file cannot be read, parsed or written.
    pub async fn collection(&self, name: &str) -> CoreResult<Collection> {
        validate_collection_name(name)?;

        let guard = self.file.lock().await;
        let mut data = guard.load().await?;
        if data.ensure_collection(name) {
            guard.persist(&data).await?;
            debug!(database = %self.name, collection = name, "created collection");
        }
        drop(guard);

        Ok(Collection::new(
            name.to_owned(),
            Arc::clone(&self.file),
            Arc::clone(&self.clock),
            Arc::clone(&self.ids),
        ))
    }

    /// Returns a typed handle to collection `name`, creating it if absent.
    ///
    /// # Errors
    ///
    /// Same as [`Database::collection`].
    pub async fn typed_collection<T: Serialize + DeserializeOwned>(
        &self,
        name: &str,
    ) -> CoreResult<TypedCollection<T>> {
        Ok(TypedCollection::new(self.collection(name).await?))
    }

    /// Returns the names of all collections, in file order.
    pub async fn collection_names(&self) -> CoreResult<Vec<String>> {
        let guard = self.file.lock().await;
        let data = guard.load().await?;
        Ok(data.collection_names().map(str::to_owned).collect())
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("path", &self.file.path())
            .finish()
    }
}

fn validate_collection_name(name: &str) -> CoreResult<()> {
    if name.is_empty() {
        return Err(CoreError::invalid_name(name, "collection name must not be empty"));
    }
    Ok(())
}
