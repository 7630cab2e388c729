//! Query shapes and root arguments.
//!
//! A `QueryShape` is the immutable tree of requested fields, mirroring the
//! fragment/field structure of the original request. Root-level results are
//! stored under the root-query record in a field keyed by field name plus
//! the canonical rendering of the query arguments, so two subscriptions
//! with different arguments never collide.

use crate::value::ScalarValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Arguments attached to a root query, rendered canonically for storage.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Arguments(BTreeMap<String, ScalarValue>);

impl Arguments {
    /// No arguments.
    pub fn none() -> Self {
        Self::default()
    }

    /// Build from (name, value) pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ScalarValue>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Builder-style argument insertion.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Get an argument value.
    pub fn get(&self, name: &str) -> Option<&ScalarValue> {
        self.0.get(name)
    }

    /// Check whether any argument is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical rendering: names sorted, values in canonical scalar form.
    pub fn canonical(&self) -> String {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(name, value)| format!("{}:{}", name, value.canonical()))
            .collect();
        parts.join(",")
    }
}

impl std::fmt::Display for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.canonical())
    }
}

/// The storage field name for a root-level field fetched with arguments.
pub fn storage_field(field_name: &str, args: &Arguments) -> String {
    if args.is_empty() {
        field_name.to_string()
    } else {
        format!("{}({})", field_name, args.canonical())
    }
}

/// One requested field, optionally with a sub-shape for nested entities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSelection {
    /// The field name as it appears in raw results and store records.
    pub name: String,
    /// Sub-shape for object-valued fields; `None` for leaves.
    pub subshape: Option<QueryShape>,
}

/// The tree of requested fields. Immutable once a subscription exists.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryShape {
    /// Requested fields in request order.
    pub selections: Vec<FieldSelection>,
}

impl QueryShape {
    /// An empty shape. Useless on its own; build it up with
    /// [`QueryShape::field`] and [`QueryShape::object`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a leaf field.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.selections.push(FieldSelection {
            name: name.into(),
            subshape: None,
        });
        self
    }

    /// Select an object-valued field with a nested shape.
    pub fn object(mut self, name: impl Into<String>, subshape: QueryShape) -> Self {
        self.selections.push(FieldSelection {
            name: name.into(),
            subshape: Some(subshape),
        });
        self
    }

    /// Look up a selection by field name.
    pub fn selection(&self, name: &str) -> Option<&FieldSelection> {
        self.selections.iter().find(|s| s.name == name)
    }

    /// Check whether the shape selects nothing.
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}
