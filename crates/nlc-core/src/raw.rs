//! Raw (denormalized) fetch results.
//!
//! Whatever the fetch collaborator produces is modeled as a tree of
//! `RawValue`s. Objects carry an optional type name, which the identity
//! scheme uses to decide whether they normalize into their own store slot.
//! Conversions to and from `serde_json::Value` use the `__typename`
//! convention for the type name.

use crate::value::ScalarValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well-known JSON field carrying an object's type name.
const TYPENAME_FIELD: &str = "__typename";

/// A raw fetched value: scalar, list, or (possibly typed) object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RawValue {
    /// A scalar leaf.
    Scalar(ScalarValue),
    /// An ordered list.
    List(Vec<RawValue>),
    /// A nested object.
    Object(RawObject),
}

impl RawValue {
    /// Convert from a `serde_json::Value`.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Scalar(ScalarValue::Null),
            serde_json::Value::Bool(b) => RawValue::Scalar(ScalarValue::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    RawValue::Scalar(ScalarValue::Int(i))
                } else {
                    RawValue::Scalar(ScalarValue::Float(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            serde_json::Value::String(s) => RawValue::Scalar(ScalarValue::Str(s.clone())),
            serde_json::Value::Array(items) => {
                RawValue::List(items.iter().map(RawValue::from_json).collect())
            }
            serde_json::Value::Object(_) => RawValue::Object(RawObject::from_json(value)),
        }
    }

    /// Convert to a `serde_json::Value`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            RawValue::Scalar(ScalarValue::Null) => serde_json::Value::Null,
            RawValue::Scalar(ScalarValue::Bool(b)) => serde_json::Value::Bool(*b),
            RawValue::Scalar(ScalarValue::Int(i)) => serde_json::Value::from(*i),
            RawValue::Scalar(ScalarValue::Float(f)) => {
                serde_json::Number::from_f64(*f).map_or(serde_json::Value::Null, serde_json::Value::Number)
            }
            RawValue::Scalar(ScalarValue::Str(s)) => serde_json::Value::String(s.clone()),
            RawValue::List(items) => {
                serde_json::Value::Array(items.iter().map(RawValue::to_json).collect())
            }
            RawValue::Object(obj) => obj.to_json(),
        }
    }
}

impl From<ScalarValue> for RawValue {
    fn from(scalar: ScalarValue) -> Self {
        RawValue::Scalar(scalar)
    }
}

/// A raw fetched object: an optional type name plus named fields.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct RawObject {
    type_name: Option<String>,
    fields: BTreeMap<String, RawValue>,
}

impl RawObject {
    /// Create an object with a type name.
    pub fn typed(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            fields: BTreeMap::new(),
        }
    }

    /// Create an object with no type name (always stored inline).
    pub fn untyped() -> Self {
        Self::default()
    }

    /// The object's type name, if any.
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Set a field.
    pub fn set(&mut self, name: impl Into<String>, value: RawValue) {
        self.fields.insert(name.into(), value);
    }

    /// Builder-style field insertion.
    pub fn with_field(mut self, name: impl Into<String>, value: RawValue) -> Self {
        self.set(name, value);
        self
    }

    /// Builder-style scalar field insertion.
    pub fn with_scalar(self, name: impl Into<String>, scalar: impl Into<ScalarValue>) -> Self {
        self.with_field(name, RawValue::Scalar(scalar.into()))
    }

    /// Get a field value.
    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.fields.get(name)
    }

    /// Iterate over (name, value) pairs in field-name order.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &RawValue)> {
        self.fields.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the object has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Convert from a `serde_json::Value::Object`, reading `__typename`.
    ///
    /// Non-object inputs produce an empty untyped object.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let serde_json::Value::Object(map) = value else {
            return Self::untyped();
        };

        let mut object = match map.get(TYPENAME_FIELD) {
            Some(serde_json::Value::String(t)) => Self::typed(t.clone()),
            _ => Self::untyped(),
        };
        for (name, field) in map {
            if name != TYPENAME_FIELD {
                object.set(name.clone(), RawValue::from_json(field));
            }
        }
        object
    }

    /// Convert to a `serde_json::Value`, writing `__typename` back.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        if let Some(t) = &self.type_name {
            map.insert(
                TYPENAME_FIELD.to_string(),
                serde_json::Value::String(t.clone()),
            );
        }
        for (name, value) in &self.fields {
            map.insert(name.clone(), value.to_json());
        }
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_roundtrip_with_typename() {
        let json = serde_json::json!({
            "__typename": "Chat",
            "id": "c-1",
            "name": "general",
            "messages": [
                { "__typename": "Message", "id": "m-1", "pinned": true }
            ]
        });

        let object = RawObject::from_json(&json);
        assert_eq!(object.type_name(), Some("Chat"));
        assert_eq!(
            object.get("id"),
            Some(&RawValue::Scalar(ScalarValue::Str("c-1".into())))
        );

        assert_eq!(object.to_json(), json);
    }

    #[test]
    fn test_untyped_object() {
        let json = serde_json::json!({ "foo": 1 });
        let object = RawObject::from_json(&json);
        assert_eq!(object.type_name(), None);
        assert_eq!(
            object.get("foo"),
            Some(&RawValue::Scalar(ScalarValue::Int(1)))
        );
    }

    #[test]
    fn test_builder_fields_are_ordered() {
        let object = RawObject::typed("User")
            .with_scalar("name", "Alice")
            .with_scalar("id", "u-1");

        let names: Vec<_> = object.fields().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
    }
}
