//! Documents: reserved fields plus an open map of application fields.

use crate::error::{CoreError, CoreResult};
use crate::id::DocumentId;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Name of the reserved identifier field.
pub const ID_FIELD: &str = "id";
/// Name of the reserved creation timestamp field.
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Name of the reserved last-update timestamp field.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Fields owned by the engine. Callers can never set them directly.
pub const RESERVED_FIELDS: [&str; 3] = [ID_FIELD, CREATED_AT_FIELD, UPDATED_AT_FIELD];

/// Application fields of a document, in insertion order.
pub type Fields = Map<String, Value>;

/// Returns true if `name` is one of the engine-owned fields.
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED_FIELDS.contains(&name)
}

/// One record in a collection.
///
/// Serializes as a flat JSON object: `id`, `createdAt`, `updatedAt`, then
/// the application fields in insertion order. Timestamps read from a file
/// are written back exactly as they were stored.
///
/// ```rust
/// use jadb_core::Document;
/// use serde_json::json;
///
/// let doc: Document = serde_json::from_value(json!({
///     "id": "1",
///     "createdAt": "2024-01-01T00:00:00.000Z",
///     "updatedAt": "2024-01-01T00:00:00.000Z",
///     "name": "a",
/// }))
/// .unwrap();
///
/// assert_eq!(doc.id().as_str(), "1");
/// assert_eq!(doc.field("name"), Some(&json!("a")));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: DocumentId,
    #[serde(rename = "createdAt")]
    created_at: Stamp,
    #[serde(rename = "updatedAt")]
    updated_at: Stamp,
    #[serde(flatten)]
    fields: Fields,
}

/// A timestamp and the exact text it is stored as.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Stamp {
    at: DateTime<Utc>,
    text: String,
}

impl Stamp {
    fn new(at: DateTime<Utc>) -> Self {
        Self {
            text: timestamp::format(&at),
            at,
        }
    }
}

impl Serialize for Stamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Stamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let at = timestamp::parse(&text).map_err(serde::de::Error::custom)?;
        Ok(Self { at, text })
    }
}

impl Document {
    /// Builds a freshly inserted document.
    pub(crate) fn create(id: DocumentId, now: DateTime<Utc>, fields: Fields) -> Self {
        let stamp = Stamp::new(now);
        Self {
            id,
            created_at: stamp.clone(),
            updated_at: stamp,
            fields,
        }
    }

    /// Returns a copy with `patch` merged over the application fields.
    ///
    /// Reserved names in `patch` are skipped: `id` and `createdAt` are
    /// immutable and `updatedAt` becomes `updated_at`.
    pub(crate) fn patched(&self, patch: &Fields, updated_at: DateTime<Utc>) -> Self {
        let mut fields = self.fields.clone();
        for (name, value) in patch {
            if !is_reserved(name) {
                fields.insert(name.clone(), value.clone());
            }
        }
        Self {
            id: self.id.clone(),
            created_at: self.created_at.clone(),
            updated_at: Stamp::new(updated_at),
            fields,
        }
    }

    /// Returns the document identifier.
    #[must_use]
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Returns when the document was inserted.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at.at
    }

    /// Returns when the document was last updated.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at.at
    }

    /// Returns the application fields.
    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Returns an application field by name.
    ///
    /// Reserved fields are not part of the map; use [`Document::get`] to
    /// look up any field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns any field by name, reserved ones included, as it appears in
    /// the serialized document. Timestamps come back as their stored text.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Cow<'_, Value>> {
        let text = |s: &str| Some(Cow::Owned(Value::String(s.to_owned())));
        match name {
            ID_FIELD => text(self.id.as_str()),
            CREATED_AT_FIELD => text(&self.created_at.text),
            UPDATED_AT_FIELD => text(&self.updated_at.text),
            _ => self.fields.get(name).map(Cow::Borrowed),
        }
    }

    /// Consumes the document and returns its application fields.
    #[must_use]
    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// Converts the document to a JSON value.
    pub fn to_value(&self) -> CoreResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decodes the whole document, reserved fields included, into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> CoreResult<T> {
        Ok(T::deserialize(self.to_value()?)?)
    }
}

/// Turns caller-supplied insert fields into an application field map.
///
/// Rejects anything but a JSON object and any reserved field name.
pub(crate) fn insert_fields(value: Value) -> CoreResult<Fields> {
    let fields = object_fields(value, "document fields")?;
    if let Some(name) = fields.keys().find(|name| is_reserved(name)) {
        return Err(CoreError::invalid_document(format!(
            "field {name:?} is managed by the engine and cannot be set"
        )));
    }
    Ok(fields)
}

/// Turns a caller-supplied patch into a field map.
///
/// Reserved names are allowed here and ignored when the patch is applied.
pub(crate) fn patch_fields(value: Value) -> CoreResult<Fields> {
    object_fields(value, "update patch")
}

fn object_fields(value: Value, what: &str) -> CoreResult<Fields> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CoreError::invalid_document(format!(
            "{what} must be a JSON object, got {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A document decoded into an application type.
///
/// `T` supplies the application fields; it is flattened next to the
/// reserved ones, exactly as the document is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    /// The document identifier.
    pub id: DocumentId,
    /// When the document was inserted.
    #[serde(rename = "createdAt", with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// When the document was last updated.
    #[serde(rename = "updatedAt", with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    /// The application fields.
    #[serde(flatten)]
    pub data: T,
}

/// RFC 3339 timestamps with millisecond precision and a `Z` suffix.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Formats a timestamp the way it is stored.
    #[must_use]
    pub fn format(at: &DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Parses any RFC 3339 timestamp.
    pub fn parse(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(text).map(|at| at.with_timezone(&Utc))
    }

    /// Serde serializer.
    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(at))
    }

    /// Serde deserializer.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    fn sample() -> Document {
        let fields = insert_fields(json!({"name": "a", "age": 3})).unwrap();
        Document::create(DocumentId::from("doc-1"), at(1_700_000_000_000), fields)
    }

    #[test]
    fn serializes_flat_with_reserved_fields_first() {
        let text = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            text,
            r#"{"id":"doc-1","createdAt":"2023-11-14T22:13:20.000Z","updatedAt":"2023-11-14T22:13:20.000Z","name":"a","age":3}"#
        );
    }

    #[test]
    fn parses_timestamps_back() {
        let doc = sample();
        let back: Document = serde_json::from_str(&serde_json::to_string(&doc).unwrap()).unwrap();
        assert_eq!(back, doc);
        assert_eq!(back.created_at(), at(1_700_000_000_000));
    }

    #[test]
    fn accepts_offset_timestamps() {
        let doc: Document = serde_json::from_value(json!({
            "id": "x",
            "createdAt": "2024-01-01T02:00:00+02:00",
            "updatedAt": "2024-01-01T00:00:00.5Z",
        }))
        .unwrap();
        assert_eq!(doc.created_at(), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert!(doc.fields().is_empty());
    }

    #[test]
    fn stored_timestamp_text_is_kept() {
        let stored = json!({
            "id": "x",
            "createdAt": "2024-01-01T00:00:00.123456Z",
            "updatedAt": "2024-01-01T02:00:00+02:00",
            "name": "a",
        });
        let doc: Document = serde_json::from_value(stored.clone()).unwrap();

        assert_eq!(
            doc.get("createdAt").unwrap().as_ref(),
            &json!("2024-01-01T00:00:00.123456Z")
        );
        assert_eq!(doc.created_at().timestamp_subsec_micros(), 123_456);
        assert_eq!(doc.to_value().unwrap(), stored);

        // Untouched on update, while the new updatedAt uses the engine format.
        let updated = doc.patched(&Fields::new(), at(1_704_067_200_500));
        assert_eq!(
            updated.get("createdAt").unwrap().as_ref(),
            &json!("2024-01-01T00:00:00.123456Z")
        );
        assert_eq!(
            updated.get("updatedAt").unwrap().as_ref(),
            &json!("2024-01-01T00:00:00.500Z")
        );
    }

    #[test]
    fn non_string_timestamp_is_an_error() {
        let result: Result<Document, _> = serde_json::from_value(json!({
            "id": "x",
            "createdAt": 5,
            "updatedAt": "2024-01-01T00:00:00.000Z",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn missing_reserved_field_is_an_error() {
        let result: Result<Document, _> = serde_json::from_value(json!({
            "createdAt": "2024-01-01T00:00:00.000Z",
            "updatedAt": "2024-01-01T00:00:00.000Z",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn get_covers_reserved_fields() {
        let doc = sample();
        assert_eq!(doc.get("id").unwrap().as_ref(), &json!("doc-1"));
        assert_eq!(
            doc.get("createdAt").unwrap().as_ref(),
            &json!("2023-11-14T22:13:20.000Z")
        );
        assert_eq!(doc.get("name").unwrap().as_ref(), &json!("a"));
        assert!(doc.get("missing").is_none());
        assert!(doc.field("id").is_none());
    }

    #[test]
    fn patched_keeps_identity_and_creation() {
        let doc = sample();
        let patch = patch_fields(json!({
            "id": "hijacked",
            "createdAt": "1999-01-01T00:00:00.000Z",
            "name": "b",
            "extra": true,
        }))
        .unwrap();

        let updated = doc.patched(&patch, at(1_700_000_001_000));

        assert_eq!(updated.id(), doc.id());
        assert_eq!(updated.created_at(), doc.created_at());
        assert_eq!(updated.updated_at(), at(1_700_000_001_000));
        assert_eq!(updated.field("name"), Some(&json!("b")));
        assert_eq!(updated.field("age"), Some(&json!(3)));
        assert_eq!(updated.field("extra"), Some(&json!(true)));
        assert!(updated.field("id").is_none());
    }

    #[test]
    fn insert_rejects_reserved_names() {
        for name in RESERVED_FIELDS {
            let err = insert_fields(json!({ name: "x" })).unwrap_err();
            assert!(matches!(err, CoreError::InvalidDocument { .. }));
        }
    }

    #[test]
    fn insert_rejects_non_objects() {
        let err = insert_fields(json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("an array"));
        assert!(patch_fields(json!("text")).is_err());
    }

    #[test]
    fn decode_into_record() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct User {
            name: String,
            age: u32,
        }

        let record: Record<User> = sample().decode().unwrap();
        assert_eq!(record.id.as_str(), "doc-1");
        assert_eq!(
            record.data,
            User {
                name: "a".into(),
                age: 3
            }
        );
    }
}
