//! Normalized field values and store records.
//!
//! A `StoreRecord` maps field names to tagged `FieldValue`s. Nested entities
//! are held by `Reference` to another store key; unkeyed substructure is
//! embedded inline as an `Object`. Merging is field-wise: scalars overwrite,
//! lists replace wholesale, references to the same key are a no-op.

use crate::identity::EntityKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A scalar leaf value.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub enum ScalarValue {
    /// Null value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// String value.
    Str(String),
}

impl ScalarValue {
    /// Canonical text rendering, stable across the process lifetime.
    ///
    /// Strings are JSON-quoted so that `Str("1")` and `Int(1)` never render
    /// the same way.
    pub fn canonical(&self) -> String {
        match self {
            ScalarValue::Null => "null".to_string(),
            ScalarValue::Bool(b) => b.to_string(),
            ScalarValue::Int(i) => i.to_string(),
            ScalarValue::Float(f) => f.to_string(),
            ScalarValue::Str(s) => serde_json::Value::String(s.clone()).to_string(),
        }
    }

    /// Render the bare value for key derivation (strings unquoted).
    pub fn id_text(&self) -> String {
        match self {
            ScalarValue::Str(s) => s.clone(),
            other => other.canonical(),
        }
    }
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::Str(s.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        ScalarValue::Str(s)
    }
}

impl From<i64> for ScalarValue {
    fn from(i: i64) -> Self {
        ScalarValue::Int(i)
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        ScalarValue::Bool(b)
    }
}

/// A value stored under a field of a normalized record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// A scalar leaf.
    Scalar(ScalarValue),
    /// A reference to another store entry.
    Reference(EntityKey),
    /// An ordered list of values.
    List(Vec<FieldValue>),
    /// An unkeyed object embedded inline.
    Object(StoreRecord),
}

impl FieldValue {
    /// Collect every entity key referenced by this value, recursing through
    /// lists and inline objects.
    pub fn collect_references(&self, out: &mut Vec<EntityKey>) {
        match self {
            FieldValue::Scalar(_) => {}
            FieldValue::Reference(key) => out.push(key.clone()),
            FieldValue::List(items) => {
                for item in items {
                    item.collect_references(out);
                }
            }
            FieldValue::Object(record) => record.collect_references(out),
        }
    }
}

/// A normalized record: field name to field value.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct StoreRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl StoreRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// Builder-style field insertion.
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.set(name, value);
        self
    }

    /// Get a field value.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Check whether a field is present.
    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterate over (name, value) pairs in field-name order.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field-wise merge of an incoming partial record.
    ///
    /// Incoming scalars overwrite, lists replace wholesale, a reference equal
    /// to the existing one is a no-op, and inline objects merge recursively.
    /// Returns `true` if any stored data actually changed.
    pub fn merge(&mut self, incoming: StoreRecord) -> bool {
        let mut changed = false;
        for (name, value) in incoming.fields {
            match (self.fields.get_mut(&name), value) {
                (Some(FieldValue::Object(existing)), FieldValue::Object(partial)) => {
                    if existing.merge(partial) {
                        changed = true;
                    }
                }
                (Some(existing), value) => {
                    if *existing != value {
                        *existing = value;
                        changed = true;
                    }
                }
                (None, value) => {
                    self.fields.insert(name, value);
                    changed = true;
                }
            }
        }
        changed
    }

    /// Collect every entity key referenced by any field.
    pub fn collect_references(&self, out: &mut Vec<EntityKey>) {
        for value in self.fields.values() {
            value.collect_references(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_canonical_distinguishes_types() {
        assert_ne!(
            ScalarValue::Str("1".to_string()).canonical(),
            ScalarValue::Int(1).canonical()
        );
        assert_eq!(ScalarValue::Int(1).canonical(), "1");
        assert_eq!(ScalarValue::Str("a".to_string()).canonical(), "\"a\"");
    }

    #[test]
    fn test_merge_scalar_overwrites() {
        let mut record = StoreRecord::new()
            .with_field("name", FieldValue::Scalar(ScalarValue::Str("old".into())));

        let incoming = StoreRecord::new()
            .with_field("name", FieldValue::Scalar(ScalarValue::Str("new".into())));

        assert!(record.merge(incoming));
        assert_eq!(
            record.get("name"),
            Some(&FieldValue::Scalar(ScalarValue::Str("new".into())))
        );
    }

    #[test]
    fn test_merge_identical_data_is_unchanged() {
        let mut record = StoreRecord::new()
            .with_field("id", FieldValue::Scalar(ScalarValue::Str("1".into())))
            .with_field(
                "tags",
                FieldValue::List(vec![FieldValue::Scalar(ScalarValue::Int(1))]),
            );

        let same = record.clone();
        assert!(!record.merge(same));
    }

    #[test]
    fn test_merge_list_replaces_wholesale() {
        let mut record = StoreRecord::new().with_field(
            "tags",
            FieldValue::List(vec![
                FieldValue::Scalar(ScalarValue::Int(1)),
                FieldValue::Scalar(ScalarValue::Int(2)),
            ]),
        );

        let incoming = StoreRecord::new().with_field(
            "tags",
            FieldValue::List(vec![FieldValue::Scalar(ScalarValue::Int(3))]),
        );

        assert!(record.merge(incoming));
        assert_eq!(
            record.get("tags"),
            Some(&FieldValue::List(vec![FieldValue::Scalar(
                ScalarValue::Int(3)
            )]))
        );
    }

    #[test]
    fn test_merge_same_reference_is_noop() {
        let key = EntityKey::entity("User", &ScalarValue::Str("1".into()));
        let mut record =
            StoreRecord::new().with_field("author", FieldValue::Reference(key.clone()));

        let incoming = StoreRecord::new().with_field("author", FieldValue::Reference(key));
        assert!(!record.merge(incoming));
    }

    #[test]
    fn test_merge_inline_object_is_recursive() {
        let mut record = StoreRecord::new().with_field(
            "meta",
            FieldValue::Object(
                StoreRecord::new().with_field("a", FieldValue::Scalar(ScalarValue::Int(1))),
            ),
        );

        let incoming = StoreRecord::new().with_field(
            "meta",
            FieldValue::Object(
                StoreRecord::new().with_field("b", FieldValue::Scalar(ScalarValue::Int(2))),
            ),
        );

        assert!(record.merge(incoming));
        let FieldValue::Object(meta) = record.get("meta").unwrap() else {
            panic!("meta should still be inline");
        };
        assert!(meta.contains_field("a"));
        assert!(meta.contains_field("b"));
    }

    #[test]
    fn test_collect_references_walks_lists_and_inline_objects() {
        let alice = EntityKey::entity("User", &ScalarValue::Str("alice".into()));
        let bob = EntityKey::entity("User", &ScalarValue::Str("bob".into()));

        let record = StoreRecord::new()
            .with_field("author", FieldValue::Reference(alice.clone()))
            .with_field(
                "meta",
                FieldValue::Object(StoreRecord::new().with_field(
                    "seen_by",
                    FieldValue::List(vec![FieldValue::Reference(bob.clone())]),
                )),
            );

        let mut refs = Vec::new();
        record.collect_references(&mut refs);
        assert!(refs.contains(&alice));
        assert!(refs.contains(&bob));
        assert_eq!(refs.len(), 2);
    }
}
