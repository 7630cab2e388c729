//! Reader - denormalizing shapes back out of the store.
//!
//! The read never mutates the store and always reports its full dependency
//! set, tombstoned keys included, so a subscription re-triggers once
//! missing data becomes available.
//!
//! Partial-data policy (fixed): a missing field or a dangling reference
//! denormalizes to `Missing` at that position while sibling fields stay
//! populated - one missing leaf never drops the subtree.

use nlc_core::identity::EntityKey;
use nlc_core::shape::{storage_field, Arguments, QueryShape};
use nlc_core::value::{FieldValue, ScalarValue, StoreRecord};
use nlc_store::RecordStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A denormalized result value.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub enum ResultValue {
    /// Requested but not present in the store.
    #[default]
    Missing,
    /// A scalar leaf.
    Scalar(ScalarValue),
    /// An ordered list.
    List(Vec<ResultValue>),
    /// A nested object, field name to value.
    Object(BTreeMap<String, ResultValue>),
}

impl ResultValue {
    /// Whether this value is `Missing`.
    pub fn is_missing(&self) -> bool {
        matches!(self, ResultValue::Missing)
    }

    /// Whether the value contains no `Missing` anywhere.
    pub fn is_complete(&self) -> bool {
        match self {
            ResultValue::Missing => false,
            ResultValue::Scalar(_) => true,
            ResultValue::List(items) => items.iter().all(ResultValue::is_complete),
            ResultValue::Object(fields) => fields.values().all(ResultValue::is_complete),
        }
    }

    /// Field lookup on object values.
    pub fn get(&self, name: &str) -> Option<&ResultValue> {
        match self {
            ResultValue::Object(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Convert to a `serde_json::Value`; `Missing` maps to `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ResultValue::Missing => serde_json::Value::Null,
            ResultValue::Scalar(ScalarValue::Null) => serde_json::Value::Null,
            ResultValue::Scalar(ScalarValue::Bool(b)) => serde_json::Value::Bool(*b),
            ResultValue::Scalar(ScalarValue::Int(i)) => serde_json::Value::from(*i),
            ResultValue::Scalar(ScalarValue::Float(f)) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            ResultValue::Scalar(ScalarValue::Str(s)) => serde_json::Value::String(s.clone()),
            ResultValue::List(items) => {
                serde_json::Value::Array(items.iter().map(ResultValue::to_json).collect())
            }
            ResultValue::Object(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

/// A denormalized value plus the keys visited producing it.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadResult {
    /// The reconstructed result.
    pub value: ResultValue,
    /// Every store key the read visited, tombstoned ones included.
    pub deps: BTreeSet<EntityKey>,
}

/// Read a root query: the shape's root fields resolved out of the
/// root-query record, argument-keyed exactly as the writer stored them.
pub fn read_query<S: RecordStore>(
    store: &S,
    shape: &QueryShape,
    args: &Arguments,
) -> ReadResult {
    let root_key = EntityKey::root_query();
    let mut deps = BTreeSet::new();
    deps.insert(root_key.clone());

    let value = match store.get(&root_key) {
        None => ResultValue::Missing,
        Some(record) => {
            let mut fields = BTreeMap::new();
            for selection in &shape.selections {
                let stored = record.get(&storage_field(&selection.name, args));
                fields.insert(
                    selection.name.clone(),
                    resolve(store, stored, selection.subshape.as_ref(), &mut deps),
                );
            }
            ResultValue::Object(fields)
        }
    };

    ReadResult { value, deps }
}

/// Read a shape anchored at an arbitrary entity key.
pub fn read_shape<S: RecordStore>(
    store: &S,
    shape: &QueryShape,
    key: &EntityKey,
) -> ReadResult {
    let mut deps = BTreeSet::new();
    let value = read_entity(store, shape, key, &mut deps);
    ReadResult { value, deps }
}

fn read_entity<S: RecordStore>(
    store: &S,
    shape: &QueryShape,
    key: &EntityKey,
    deps: &mut BTreeSet<EntityKey>,
) -> ResultValue {
    deps.insert(key.clone());
    match store.get(key) {
        None => ResultValue::Missing,
        Some(record) => read_record(store, shape, record, deps),
    }
}

fn read_record<S: RecordStore>(
    store: &S,
    shape: &QueryShape,
    record: &StoreRecord,
    deps: &mut BTreeSet<EntityKey>,
) -> ResultValue {
    let mut fields = BTreeMap::new();
    for selection in &shape.selections {
        fields.insert(
            selection.name.clone(),
            resolve(
                store,
                record.get(&selection.name),
                selection.subshape.as_ref(),
                deps,
            ),
        );
    }
    ResultValue::Object(fields)
}

fn resolve<S: RecordStore>(
    store: &S,
    stored: Option<&FieldValue>,
    subshape: Option<&QueryShape>,
    deps: &mut BTreeSet<EntityKey>,
) -> ResultValue {
    match stored {
        None => ResultValue::Missing,
        Some(FieldValue::Scalar(scalar)) => ResultValue::Scalar(scalar.clone()),
        Some(FieldValue::Reference(key)) => match subshape {
            Some(shape) => read_entity(store, shape, key, deps),
            // A reference is not scalar-representable; still record the
            // dependency so the subscription tracks the referenced entity.
            None => {
                deps.insert(key.clone());
                ResultValue::Missing
            }
        },
        Some(FieldValue::List(items)) => ResultValue::List(
            items
                .iter()
                .map(|item| resolve(store, Some(item), subshape, deps))
                .collect(),
        ),
        Some(FieldValue::Object(inline)) => match subshape {
            Some(shape) => read_record(store, shape, inline, deps),
            None => inline_verbatim(inline, deps),
        },
    }
}

/// Denormalize an inline object with no shape: everything it embeds comes
/// back as-is. References cannot be expanded without a shape, so they read
/// as missing while still registering the dependency.
fn inline_verbatim(record: &StoreRecord, deps: &mut BTreeSet<EntityKey>) -> ResultValue {
    let mut fields = BTreeMap::new();
    for (name, value) in record.fields() {
        fields.insert(name.clone(), verbatim_value(value, deps));
    }
    ResultValue::Object(fields)
}

fn verbatim_value(value: &FieldValue, deps: &mut BTreeSet<EntityKey>) -> ResultValue {
    match value {
        FieldValue::Scalar(scalar) => ResultValue::Scalar(scalar.clone()),
        FieldValue::Reference(key) => {
            deps.insert(key.clone());
            ResultValue::Missing
        }
        FieldValue::List(items) => ResultValue::List(
            items.iter().map(|item| verbatim_value(item, deps)).collect(),
        ),
        FieldValue::Object(inline) => inline_verbatim(inline, deps),
    }
}
