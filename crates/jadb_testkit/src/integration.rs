//! Cross-crate integration test helpers.
//!
//! Provides a harness that mirrors every write into an in-memory model
//! and checks the stored collection against it.

use crate::fixtures::TestClient;
use jadb_core::{Collection, Document, Query, Value};

/// A test harness for integration testing.
pub struct IntegrationHarness {
    /// The client fixture.
    pub store: TestClient,
    /// The collection under test.
    pub collection: Collection,
    /// Expected documents, in stored order.
    model: Vec<Document>,
}

impl IntegrationHarness {
    /// Creates a harness over collection `items` of database `test`.
    pub async fn new(store: TestClient) -> Self {
        let collection = store.collection("test", "items").await;
        Self {
            store,
            collection,
            model: Vec::new(),
        }
    }

    /// Inserts a document and tracks it.
    pub async fn insert(&mut self, fields: Value) -> Document {
        let doc = self
            .collection
            .insert_one(fields)
            .await
            .expect("Failed to insert document");
        self.model.push(doc.clone());
        doc
    }

    /// Runs `update_one` and mirrors the replace-by-predicate rule.
    pub async fn update_one(&mut self, query: &Query, patch: Value) -> Option<Document> {
        let updated = self
            .collection
            .update_one(query, patch)
            .await
            .expect("Failed to update document");
        if let Some(doc) = &updated {
            for slot in self.model.iter_mut().filter(|d| query.matches(d)) {
                *slot = doc.clone();
            }
        }
        updated
    }

    /// Runs `delete_many` and drops the matches from the model.
    pub async fn delete_many(&mut self, query: &Query) -> usize {
        let removed = self
            .collection
            .delete_many(query)
            .await
            .expect("Failed to delete documents");
        let before = self.model.len();
        self.model.retain(|doc| !query.matches(doc));
        assert_eq!(removed, before - self.model.len(), "delete count mismatch");
        removed
    }

    /// Verifies the stored collection equals the model.
    pub async fn verify_all(&self) {
        let stored = self.collection.find(None).await.expect("Failed to read collection");
        assert_eq!(stored, self.model, "stored documents diverge from model");
    }

    /// Returns the count of tracked documents.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.model.len()
    }
}

/// Persistence checks across client instances.
pub mod persistence {
    use super::*;
    use jadb_core::Client;

    /// Asserts that a fresh client over the same files sees `expected`.
    pub async fn assert_visible_after_reopen(
        client: &Client,
        db: &str,
        collection: &str,
        expected: &[Document],
    ) {
        let stored = client
            .database(db)
            .await
            .expect("Failed to open database")
            .collection(collection)
            .await
            .expect("Failed to open collection")
            .find(None)
            .await
            .expect("Failed to read collection");
        assert_eq!(stored, expected);
    }
}

/// Checks on the on-disk file format.
pub mod file_format {
    use jadb_core::{DatabaseFile, Value};

    /// Parses raw file text, asserting it is a JSON object of arrays.
    pub fn parse(text: &str) -> DatabaseFile {
        let value: Value = serde_json::from_str(text).expect("file is not valid JSON");
        let object = value.as_object().expect("file root is not an object");
        for (name, docs) in object {
            assert!(docs.is_array(), "collection {name} is not an array");
        }
        DatabaseFile::parse(text.as_bytes()).expect("file does not parse")
    }
}
