//! Entity identity - deriving stable store keys from typed objects.
//!
//! A keyed entity collapses to one store slot per (type name, id value).
//! Objects without an id-bearing field are `Inline`: embedded verbatim in
//! their parent record instead of being normalized out.

use crate::raw::{RawObject, RawValue};
use crate::value::ScalarValue;
use serde::{Deserialize, Serialize};

/// Field names probed for an entity id, in order.
const ID_FIELDS: [&str; 2] = ["id", "_id"];

/// Synthetic key anchoring root query results.
const ROOT_QUERY: &str = "ROOT_QUERY";

/// A stable key into the normalized store.
///
/// Derived deterministically from (type name, id value); identical inputs
/// yield the identical key for the whole process lifetime.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityKey(String);

impl EntityKey {
    /// Key for a typed entity. The type name is always part of the key so
    /// two types sharing numeric ids never collide.
    pub fn entity(type_name: &str, id: &ScalarValue) -> Self {
        EntityKey(format!("{}:{}", type_name, id.id_text()))
    }

    /// The synthetic root-query pseudo-key.
    pub fn root_query() -> Self {
        EntityKey(ROOT_QUERY.to_string())
    }

    /// Whether this is the root-query pseudo-key.
    pub fn is_root(&self) -> bool {
        self.0 == ROOT_QUERY
    }

    /// The key's canonical text form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of identifying a raw object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identity {
    /// The object normalizes into its own store slot.
    Keyed(EntityKey),
    /// The object stays embedded inside its parent record.
    Inline,
}

/// Derive the identity of a raw object. Deterministic and pure.
///
/// An object is keyed when it carries a type name and a scalar `id` (or
/// `_id`) field; anything else is stored inline.
pub fn identify(object: &RawObject) -> Identity {
    let Some(type_name) = object.type_name() else {
        return Identity::Inline;
    };

    for field in ID_FIELDS {
        if let Some(RawValue::Scalar(id)) = object.get(field) {
            if !matches!(id, ScalarValue::Null) {
                return Identity::Keyed(EntityKey::entity(type_name, id));
            }
        }
    }

    Identity::Inline
}
