//! Typed collection implementation.

use crate::collection::engine::Collection;
use crate::document::{Document, Record};
use crate::error::{CoreError, CoreResult};
use crate::query::Query;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// A collection whose application fields are described by `T`.
///
/// `TypedCollection<T>` runs the exact same operations as [`Collection`];
/// it serializes inputs with serde and decodes every returned document
/// into a [`Record<T>`].
///
/// # Example
///
/// ```rust
/// use jadb_core::{Client, Query};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize, PartialEq)]
/// struct User {
///     name: String,
///     age: u32,
/// }
///
/// # let rt = tokio::runtime::Runtime::new().unwrap();
/// # rt.block_on(async {
/// let client = Client::in_memory();
/// let users = client
///     .database("app")
///     .await?
///     .typed_collection::<User>("users")
///     .await?;
///
/// let alice = users.insert_one(&User { name: "alice".into(), age: 30 }).await?;
/// assert_eq!(alice.data.age, 30);
///
/// let found = users.find(Some(&Query::new().eq("age", 30))).await?;
/// assert_eq!(found, vec![alice]);
/// # Ok::<(), jadb_core::CoreError>(())
/// # }).unwrap();
/// ```
pub struct TypedCollection<T> {
    inner: Collection,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> TypedCollection<T> {
    /// Wraps an untyped collection.
    #[must_use]
    pub fn new(inner: Collection) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// Returns the collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Returns the untyped collection.
    #[must_use]
    pub fn untyped(&self) -> &Collection {
        &self.inner
    }

    /// Returns records matching `query` (all for `None`).
    pub async fn find(&self, query: Option<&Query>) -> CoreResult<Vec<Record<T>>> {
        decode_all(self.inner.find(query).await?)
    }

    /// Returns the first record matching `query`.
    pub async fn find_one(&self, query: &Query) -> CoreResult<Option<Record<T>>> {
        decode_opt(self.inner.find_one(query).await?)
    }

    /// Counts records matching `query`.
    pub async fn count(&self, query: Option<&Query>) -> CoreResult<usize> {
        self.inner.count(query).await
    }

    /// Inserts `item` and returns the stored record.
    pub async fn insert_one(&self, item: &T) -> CoreResult<Record<T>> {
        let doc = self.inner.insert_one(to_object(item)?).await?;
        doc.decode()
    }

    /// Inserts every item with a single write.
    pub async fn insert_many(&self, items: &[T]) -> CoreResult<Vec<Record<T>>> {
        let values = items.iter().map(to_object).collect::<CoreResult<Vec<_>>>()?;
        decode_all(self.inner.insert_many(values).await?)
    }

    /// Updates the first match of `query` with `patch`.
    ///
    /// `patch` can be any serializable partial document; see
    /// [`Collection::update_one`] for the replace-by-predicate rule.
    pub async fn update_one<P: Serialize>(
        &self,
        query: &Query,
        patch: &P,
    ) -> CoreResult<Option<Record<T>>> {
        decode_opt(self.inner.update_one(query, to_object(patch)?).await?)
    }

    /// Applies each patch to the first match of `query`.
    ///
    /// See [`Collection::update_many`].
    pub async fn update_many<P: Serialize>(
        &self,
        query: &Query,
        patches: &[P],
    ) -> CoreResult<Vec<Record<T>>> {
        let values = patches.iter().map(to_object).collect::<CoreResult<Vec<_>>>()?;
        decode_all(self.inner.update_many(query, values).await?)
    }

    /// Deletes the first match of `query` and returns it.
    pub async fn delete_one(&self, query: &Query) -> CoreResult<Option<Record<T>>> {
        decode_opt(self.inner.delete_one(query).await?)
    }

    /// Deletes every match of `query`.
    pub async fn delete_many(&self, query: &Query) -> CoreResult<usize> {
        self.inner.delete_many(query).await
    }
}

impl<T> Clone for TypedCollection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for TypedCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedCollection")
            .field("inner", &self.inner)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

fn to_object<S: Serialize + ?Sized>(item: &S) -> CoreResult<Value> {
    match serde_json::to_value(item)? {
        value @ Value::Object(_) => Ok(value),
        _ => Err(CoreError::invalid_document(
            "typed items must serialize to a JSON object",
        )),
    }
}

fn decode_all<T: DeserializeOwned>(docs: Vec<Document>) -> CoreResult<Vec<Record<T>>> {
    docs.iter().map(|doc| doc.decode()).collect()
}

fn decode_opt<T: DeserializeOwned>(doc: Option<Document>) -> CoreResult<Option<Record<T>>> {
    doc.map(|doc| doc.decode()).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Client;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Task {
        title: String,
        done: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        owner: Option<String>,
    }

    #[derive(Serialize)]
    struct Done {
        done: bool,
    }

    fn task(title: &str) -> Task {
        Task {
            title: title.into(),
            done: false,
            owner: None,
        }
    }

    async fn tasks() -> TypedCollection<Task> {
        Client::in_memory()
            .database("todo")
            .await
            .unwrap()
            .typed_collection("tasks")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn typed_insert_and_find() {
        let tasks = tasks().await;
        let inserted = tasks
            .insert_many(&[task("write"), task("test")])
            .await
            .unwrap();

        assert_eq!(inserted[0].data, task("write"));
        assert_eq!(tasks.find(None).await.unwrap(), inserted);
        assert_eq!(tasks.count(None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn typed_update_with_partial_patch() {
        let tasks = tasks().await;
        let original = tasks.insert_one(&task("write")).await.unwrap();

        let updated = tasks
            .update_one(&Query::new().eq("title", "write"), &Done { done: true })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, original.id);
        assert!(updated.data.done);
        assert!(updated.updated_at > original.updated_at);

        let many = tasks
            .update_many(
                &Query::new().eq("title", "write"),
                &[Done { done: false }],
            )
            .await
            .unwrap();
        assert!(!many[0].data.done);
    }

    #[tokio::test]
    async fn typed_delete() {
        let tasks = tasks().await;
        tasks
            .insert_many(&[task("a"), task("b"), task("b")])
            .await
            .unwrap();

        let deleted = tasks
            .delete_one(&Query::new().eq("title", "a"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(deleted.data.title, "a");
        assert_eq!(
            tasks.delete_many(&Query::new().eq("title", "b")).await.unwrap(),
            2
        );
        assert!(tasks.find_one(&Query::new().eq("done", false)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn non_object_items_are_rejected() {
        let client = Client::in_memory();
        let numbers: TypedCollection<u32> = client
            .database("db")
            .await
            .unwrap()
            .typed_collection("numbers")
            .await
            .unwrap();

        assert!(matches!(
            numbers.insert_one(&7).await,
            Err(CoreError::InvalidDocument { .. })
        ));
    }

    #[tokio::test]
    async fn undecodable_documents_surface_as_json_errors() {
        let client = Client::in_memory();
        let db = client.database("db").await.unwrap();
        db.collection("tasks")
            .await
            .unwrap()
            .insert_one(serde_json::json!({"title": 5}))
            .await
            .unwrap();

        let tasks: TypedCollection<Task> = db.typed_collection("tasks").await.unwrap();
        assert!(matches!(tasks.find(None).await, Err(CoreError::Json(_))));
    }
}
