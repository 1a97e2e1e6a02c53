//! Document collection engine.

use crate::clock::{next_update, truncate_to_millis, Clock};
use crate::document::{insert_fields, patch_fields, Document, Fields};
use crate::error::{CoreError, CoreResult};
use crate::id::IdGenerator;
use crate::query::Query;
use crate::store::DocumentFile;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// What to do with the file after an operation ran on the documents.
enum Commit<R> {
    /// Write the changed documents back.
    Write(R),
    /// Leave the file untouched.
    Discard(R),
}

/// A named collection inside one database file.
///
/// Every operation is a full cycle: lock the file, load it, work on this
/// collection's documents, write the whole file back. Nothing is cached
/// between calls, so a handle always sees the file's current state.
///
/// # Replace-by-predicate
///
/// `update_one` and `update_many` locate the *first* matching document,
/// build the updated document from it, and then replace **every**
/// document matching the query with that one value. With a query that
/// matches several documents, all of them collapse into copies of the
/// updated document (same `id` included). Target a unique field such as
/// `id` to update exactly one document.
///
/// # Example
///
/// ```rust
/// use jadb_core::{Client, Query};
/// use serde_json::json;
///
/// # let rt = tokio::runtime::Runtime::new().unwrap();
/// # rt.block_on(async {
/// let client = Client::in_memory();
/// let users = client.database("app").await?.collection("users").await?;
///
/// let alice = users.insert_one(json!({"name": "alice"})).await?;
/// let found = users.find_one(&Query::new().eq("name", "alice")).await?;
/// assert_eq!(found.as_ref(), Some(&alice));
/// # Ok::<(), jadb_core::CoreError>(())
/// # }).unwrap();
/// ```
#[derive(Clone)]
pub struct Collection {
    name: String,
    file: Arc<DocumentFile>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl Collection {
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

    /// Returns the collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the path of the backing file, if it lives on disk.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.file.path()
    }

    /// Returns documents matching `query`, in stored order.
    ///
    /// `None` or an empty query returns every document.
    pub async fn find(&self, query: Option<&Query>) -> CoreResult<Vec<Document>> {
        let documents = self.load().await?;
        Ok(match query {
            Some(query) if !query.is_empty() => documents
                .into_iter()
                .filter(|doc| query.matches(doc))
                .collect(),
            _ => documents,
        })
    }

    /// Returns the first document matching `query`.
    ///
    /// An empty query matches nothing here and yields `None`.
    pub async fn find_one(&self, query: &Query) -> CoreResult<Option<Document>> {
        if query.is_empty() {
            return Ok(None);
        }
        let documents = self.load().await?;
        Ok(documents.into_iter().find(|doc| query.matches(doc)))
    }

    /// Counts documents matching `query` (all documents for `None`).
    pub async fn count(&self, query: Option<&Query>) -> CoreResult<usize> {
        Ok(self.find(query).await?.len())
    }

    /// Inserts one document built from `fields` and returns it.
    ///
    /// The engine assigns `id`, `createdAt` and `updatedAt`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDocument`] if `fields` is not an object
    /// or sets a reserved field.
    pub async fn insert_one(&self, fields: Value) -> CoreResult<Document> {
        let fields = insert_fields(fields)?;
        self.mutate(|documents| {
            let document = self.create(fields);
            documents.push(document.clone());
            Commit::Write(document)
        })
        .await
    }

    /// Inserts one document per element of `items`, in order, with a
    /// single write.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDocument`] if any element is rejected;
    /// nothing is inserted in that case.
    pub async fn insert_many(&self, items: Vec<Value>) -> CoreResult<Vec<Document>> {
        let items = items
            .into_iter()
            .map(insert_fields)
            .collect::<CoreResult<Vec<_>>>()?;
        self.mutate(|documents| {
            let created: Vec<Document> = items.into_iter().map(|f| self.create(f)).collect();
            documents.extend(created.iter().cloned());
            Commit::Write(created)
        })
        .await
    }

    /// Updates the first document matching `query` with `patch`.
    ///
    /// Every document matching `query` is replaced by the updated document
    /// (see the type-level docs). Returns `None`, without writing, if
    /// nothing matches.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidQuery`] for an empty query and
    /// [`CoreError::InvalidDocument`] if `patch` is not an object.
    pub async fn update_one(&self, query: &Query, patch: Value) -> CoreResult<Option<Document>> {
        require_target(query, "update_one")?;
        let patch = patch_fields(patch)?;
        self.mutate(|documents| {
            let Some(target) = documents.iter().find(|doc| query.matches(doc)) else {
                return Commit::Discard(None);
            };
            let updated = self.apply(target, &patch);
            replace_matching(documents, query, &updated);
            Commit::Write(Some(updated))
        })
        .await
    }

    /// Applies each patch in `patches` to the first document matching
    /// `query`, with a single write.
    ///
    /// The target is resolved against the documents as loaded when the
    /// call starts and does not move between patches: every patch is
    /// applied to that same original document, producing one updated
    /// document each. Documents matching `query` end up replaced by the
    /// result of the last patch. Returns the updated documents, one per
    /// patch, or an empty list if nothing matches.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidQuery`] for an empty query and
    /// [`CoreError::InvalidDocument`] if a patch is not an object.
    pub async fn update_many(&self, query: &Query, patches: Vec<Value>) -> CoreResult<Vec<Document>> {
        require_target(query, "update_many")?;
        let patches = patches
            .into_iter()
            .map(patch_fields)
            .collect::<CoreResult<Vec<_>>>()?;
        self.mutate(|documents| {
            let Some(target) = documents.iter().find(|doc| query.matches(doc)).cloned() else {
                return Commit::Write(Vec::new());
            };
            let updated: Vec<Document> = patches.iter().map(|p| self.apply(&target, p)).collect();
            if let Some(last) = updated.last() {
                replace_matching(documents, query, last);
            }
            Commit::Write(updated)
        })
        .await
    }

    /// Deletes the first document matching `query` and returns it.
    ///
    /// Removal is by `id`, so any other document sharing that id goes too.
    /// The file is rewritten even when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidQuery`] for an empty query.
    pub async fn delete_one(&self, query: &Query) -> CoreResult<Option<Document>> {
        require_target(query, "delete_one")?;
        self.mutate(|documents| {
            let deleted = documents.iter().find(|doc| query.matches(doc)).cloned();
            if let Some(target) = &deleted {
                documents.retain(|doc| doc.id() != target.id());
            }
            Commit::Write(deleted)
        })
        .await
    }

    /// Deletes every document matching `query` and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidQuery`] for an empty query.
    pub async fn delete_many(&self, query: &Query) -> CoreResult<usize> {
        require_target(query, "delete_many")?;
        self.mutate(|documents| {
            let before = documents.len();
            documents.retain(|doc| !query.matches(doc));
            Commit::Write(before - documents.len())
        })
        .await
    }

    fn create(&self, fields: Fields) -> Document {
        let now = truncate_to_millis(self.clock.now());
        Document::create(self.ids.generate(), now, fields)
    }

    fn apply(&self, target: &Document, patch: &Fields) -> Document {
        let updated_at = next_update(target.updated_at(), self.clock.now());
        target.patched(patch, updated_at)
    }

    async fn load(&self) -> CoreResult<Vec<Document>> {
        let guard = self.file.lock().await;
        guard.load().await?.documents(&self.name)
    }

    async fn mutate<R>(&self, op: impl FnOnce(&mut Vec<Document>) -> Commit<R>) -> CoreResult<R> {
        let guard = self.file.lock().await;
        let mut data = guard.load().await?;
        let mut documents = data.documents(&self.name)?;
        match op(&mut documents) {
            Commit::Write(result) => {
                data.set_documents(&self.name, &documents)?;
                guard.persist(&data).await?;
                Ok(result)
            }
            Commit::Discard(result) => Ok(result),
        }
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("path", &self.file.path())
            .finish()
    }
}

fn require_target(query: &Query, operation: &'static str) -> CoreResult<()> {
    if query.is_empty() {
        return Err(CoreError::invalid_query(operation));
    }
    Ok(())
}

fn replace_matching(documents: &mut [Document], query: &Query, updated: &Document) {
    for doc in documents.iter_mut().filter(|doc| query.matches(doc)) {
        *doc = updated.clone();
    }
}
