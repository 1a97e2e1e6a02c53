//! Exact-match queries.
//!
//! A query is a partial document: a set of field names with required
//! values. A document matches when every queried field is present and
//! strictly equal to the required value. Only top-level fields are
//! considered; there are no operators, ranges or nested paths.

use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// An exact-match filter over top-level fields.
///
/// ```rust
/// use jadb_core::Query;
///
/// let query = Query::new().eq("name", "a").eq("age", 3);
/// assert_eq!(query.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    conditions: Map<String, Value>,
}

impl Query {
    /// Creates an empty query. An empty query matches every document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the required value for `field`.
    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.insert(field.into(), value.into());
        self
    }

    /// Builds a query from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDocument`] if `value` is not an object.
    pub fn from_value(value: Value) -> CoreResult<Self> {
        match value {
            Value::Object(conditions) => Ok(Self { conditions }),
            _ => Err(CoreError::invalid_document("query must be a JSON object")),
        }
    }

    /// Builds a query from any serializable partial document.
    ///
    /// # Errors
    ///
    /// Returns an error if `partial` does not serialize to a JSON object.
    pub fn from_serialize<T: Serialize>(partial: &T) -> CoreResult<Self> {
        Self::from_value(serde_json::to_value(partial)?)
    }

    /// Returns true if the query has no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Returns the number of conditions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Returns the conditions as field/value pairs.
    pub fn conditions(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.conditions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns true if `document` satisfies every condition.
    ///
    /// Reserved fields can be queried too: `id` as its string and the
    /// timestamps as their stored RFC 3339 text.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        self.conditions.iter().all(|(field, expected)| {
            document
                .get(field)
                .is_some_and(|actual| strict_eq(&actual, expected))
        })
    }
}

impl TryFrom<Value> for Query {
    type Error = CoreError;

    fn try_from(value: Value) -> CoreResult<Self> {
        Self::from_value(value)
    }
}

impl From<Map<String, Value>> for Query {
    fn from(conditions: Map<String, Value>) -> Self {
        Self { conditions }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Query {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            conditions: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Equality used by queries.
///
/// Structural JSON equality, except that numbers compare by numeric value
/// so `1` equals `1.0`.
#[must_use]
pub fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_eq(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| strict_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| strict_eq(x, y)))
        }
        _ => a == b,
    }
}

fn numbers_eq(x: &Number, y: &Number) -> bool {
    if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
        return x == y;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}
