//! Property-based test generators using proptest.
//!
//! Strategies here never produce the reserved fields `id`, `createdAt`
//! or `updatedAt`, so generated objects are always insertable.

use jadb_core::{Fields, Query, Value};
use proptest::prelude::*;

/// Strategy for application field names.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("f_[a-z]{1,6}").expect("Invalid regex")
}

/// Strategy for valid collection names.
pub fn collection_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_]{0,31}").expect("Invalid regex")
}

/// Strategy for valid database names.
pub fn database_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_-]{0,15}").expect("Invalid regex")
}

/// Strategy for scalar JSON values.
///
/// Floats are kept finite so they survive a trip through the file.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        (-1.0e9f64..1.0e9).prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
    ]
}

/// Strategy for JSON values nested up to a few levels.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_value_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(field_name_strategy(), inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

/// Strategy for application field maps.
pub fn fields_strategy() -> impl Strategy<Value = Fields> {
    prop::collection::btree_map(field_name_strategy(), value_strategy(), 0..6)
        .prop_map(|map| map.into_iter().collect())
}

/// Strategy for insertable documents (JSON objects without reserved keys).
pub fn document_strategy() -> impl Strategy<Value = Value> {
    fields_strategy().prop_map(Value::Object)
}

/// Strategy for small batches of insertable documents.
pub fn documents_strategy(max: usize) -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(document_strategy(), 0..=max)
}

/// Strategy for documents drawn from a tiny value space, so that
/// equality queries over them actually match something.
pub fn clustered_document_strategy() -> impl Strategy<Value = Value> {
    prop::collection::btree_map(
        prop::sample::select(vec!["f_a", "f_b", "f_c"]),
        prop::sample::select(vec![Value::from(0), Value::from(1), Value::from("x")]),
        0..3,
    )
    .prop_map(|map| {
        Value::Object(
            map.into_iter()
                .map(|(key, value)| (key.to_owned(), value))
                .collect(),
        )
    })
}

/// Strategy for non-empty queries over the clustered value space.
pub fn clustered_query_strategy() -> impl Strategy<Value = Query> {
    prop::collection::btree_map(
        prop::sample::select(vec!["f_a", "f_b", "f_c"]),
        prop::sample::select(vec![Value::from(0), Value::from(1), Value::from("x")]),
        1..3,
    )
    .prop_map(|map| map.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jadb_core::is_reserved;

    proptest! {
        #[test]
        fn field_names_are_not_reserved(name in field_name_strategy()) {
            prop_assert!(!is_reserved(&name));
        }

        #[test]
        fn documents_are_objects(doc in document_strategy()) {
            prop_assert!(doc.is_object());
        }

        #[test]
        fn clustered_queries_are_never_empty(query in clustered_query_strategy()) {
            prop_assert!(!query.is_empty());
        }

        #[test]
        fn collection_names_are_non_empty(name in collection_name_strategy()) {
            prop_assert!(!name.is_empty());
        }
    }
}
