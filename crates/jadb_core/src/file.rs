//! The persisted database file model.
//!
//! ```text
//! {
//!     "<collection>": [ { "id": ..., "createdAt": ..., "updatedAt": ..., ... }, ... ],
//!     ...
//! }
//! ```
//!
//! Every operation reads the whole mapping, changes one collection and
//! writes the whole mapping back. Collections other than the one being
//! changed are carried through as raw JSON.

use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Serializer, Value};

/// Contents of a database file: collection name to document array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabaseFile {
    collections: Map<String, Value>,
}

impl DatabaseFile {
    /// Creates an empty mapping (`{}`).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses file contents.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Json`] if the bytes are not JSON and
    /// [`CoreError::MalformedFile`] if the top level is not an object.
    pub fn parse(bytes: &[u8]) -> CoreResult<Self> {
        match serde_json::from_slice::<Value>(bytes)? {
            Value::Object(collections) => Ok(Self { collections }),
            _ => Err(CoreError::malformed_file(
                "top level must be an object of collections",
            )),
        }
    }

    /// Serializes the mapping, pretty-printed with `indent` spaces.
    pub fn to_bytes(&self, indent: usize) -> CoreResult<Vec<u8>> {
        let indent = " ".repeat(indent);
        let mut out = Vec::new();
        let mut serializer =
            Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(indent.as_bytes()));
        self.collections.serialize(&mut serializer)?;
        Ok(out)
    }

    /// Returns true if a collection named `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Returns collection names in file order.
    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// Adds an empty collection if `name` is absent.
    ///
    /// Returns `true` if the collection was created.
    pub fn ensure_collection(&mut self, name: &str) -> bool {
        if self.collections.contains_key(name) {
            return false;
        }
        self.collections
            .insert(name.to_owned(), Value::Array(Vec::new()));
        true
    }

    /// Decodes the documents of collection `name`, in stored order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] if the key is absent,
    /// [`CoreError::MalformedFile`] if it is not an array, and
    /// [`CoreError::Json`] if a document is malformed.
    pub fn documents(&self, name: &str) -> CoreResult<Vec<Document>> {
        match self.collections.get(name) {
            None => Err(CoreError::CollectionNotFound {
                name: name.to_owned(),
            }),
            Some(value @ Value::Array(_)) => Ok(Vec::<Document>::deserialize(value)?),
            Some(_) => Err(CoreError::malformed_file(format!(
                "collection {name:?} is not an array"
            ))),
        }
    }

    /// Replaces the documents of collection `name`.
    pub fn set_documents(&mut self, name: &str, documents: &[Document]) -> CoreResult<()> {
        let value = serde_json::to_value(documents)?;
        self.collections.insert(name.to_owned(), value);
        Ok(())
    }
}
