//! Document identifiers and how they are generated.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a document.
///
/// Stored as the document's `id` string. Identifiers are:
/// - Assigned by the engine when a document is inserted
/// - Immutable once assigned
/// - Unique within a collection by convention of the generator
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Creates a new random identifier (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Creates an identifier from a UUID, in hyphenated lowercase form.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid.to_string())
    }

    /// Returns the identifier as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier and returns the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Uuid> for DocumentId {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.into_string()
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Source of fresh document identifiers.
///
/// The engine does not check generated ids for collisions; uniqueness is
/// the generator's responsibility.
pub trait IdGenerator: Send + Sync + fmt::Debug {
    /// Returns a new identifier.
    fn generate(&self) -> DocumentId;
}

/// Generates random UUID v4 identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> DocumentId {
        DocumentId::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn new_is_unique() {
        let id1 = DocumentId::new();
        let id2 = DocumentId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn uuid_form() {
        let uuid = Uuid::new_v4();
        let id = DocumentId::from(uuid);
        assert_eq!(id.as_str(), uuid.to_string());
        assert_eq!(id.as_str().len(), 36);
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = DocumentId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");

        let back: DocumentId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn display_and_debug() {
        let id = DocumentId::from("abc");
        assert_eq!(id.to_string(), "abc");
        assert_eq!(format!("{id:?}"), "DocumentId(abc)");
    }

    #[test]
    fn into_string_returns_the_stored_text() {
        let id = DocumentId::from("doc-7");
        assert_eq!(id.clone().into_string(), "doc-7");
        assert_eq!(String::from(id), "doc-7");
    }

    #[test]
    fn generator_produces_distinct_ids() {
        let ids: HashSet<_> = (0..1000).map(|_| UuidGenerator.generate()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
