//! Writer - normalizing raw results into the store.
//!
//! The walk is shape-driven: for each selected field, a keyable object is
//! merged into its own slot and replaced by a reference, lists normalize
//! per element, scalars store as-is, and unkeyed objects embed inline.
//! Root-level fields anchor under the root-query pseudo-key, suffixed with
//! the canonical argument rendering.
//!
//! Writing the same raw result twice is idempotent: the store ends in the
//! same state, the touched set is identical, and the second change notice
//! is empty.

use nlc_core::identity::{identify, EntityKey, Identity};
use nlc_core::raw::{RawObject, RawValue};
use nlc_core::shape::{storage_field, Arguments, QueryShape};
use nlc_core::value::{FieldValue, StoreRecord};
use nlc_store::{ChangeNotice, RecordStore};
use std::collections::BTreeSet;

/// Identity fields carried into the record even when unselected.
const ID_FIELDS: [&str; 2] = ["id", "_id"];

/// Outcome of one normalizing write.
#[derive(Clone, Debug)]
pub struct WriteResult {
    /// The key the result was anchored under.
    pub root_key: EntityKey,
    /// Every key the write visited, changed or not.
    pub touched: BTreeSet<EntityKey>,
    /// Keys whose stored data actually changed.
    pub changes: ChangeNotice,
}

struct WriteContext {
    touched: BTreeSet<EntityKey>,
    changes: ChangeNotice,
}

/// Normalize a raw root result into the store.
pub fn write_query<S: RecordStore>(
    store: &mut S,
    shape: &QueryShape,
    args: &Arguments,
    result: &RawObject,
) -> WriteResult {
    let root_key = EntityKey::root_query();
    let mut ctx = WriteContext {
        touched: BTreeSet::new(),
        changes: ChangeNotice::empty(),
    };
    ctx.touched.insert(root_key.clone());

    let mut root_partial = StoreRecord::new();
    for selection in &shape.selections {
        if let Some(value) = result.get(&selection.name) {
            let normalized =
                normalize_value(store, value, selection.subshape.as_ref(), &mut ctx);
            root_partial.set(storage_field(&selection.name, args), normalized);
        }
    }

    let notice = store.merge(root_key.clone(), root_partial);
    ctx.changes.absorb(notice);

    WriteResult {
        root_key,
        touched: ctx.touched,
        changes: ctx.changes,
    }
}

fn normalize_value<S: RecordStore>(
    store: &mut S,
    value: &RawValue,
    subshape: Option<&QueryShape>,
    ctx: &mut WriteContext,
) -> FieldValue {
    match value {
        RawValue::Scalar(scalar) => FieldValue::Scalar(scalar.clone()),
        RawValue::List(items) => FieldValue::List(
            items
                .iter()
                .map(|item| normalize_value(store, item, subshape, ctx))
                .collect(),
        ),
        RawValue::Object(object) => match subshape {
            Some(shape) => normalize_object(store, object, shape, ctx),
            // Without a shape there is nothing to drive extraction: the
            // object is embedded verbatim.
            None => FieldValue::Object(embed_verbatim(object)),
        },
    }
}

fn normalize_object<S: RecordStore>(
    store: &mut S,
    object: &RawObject,
    shape: &QueryShape,
    ctx: &mut WriteContext,
) -> FieldValue {
    match identify(object) {
        Identity::Keyed(key) => {
            let partial = shaped_record(store, object, shape, ctx);
            let notice = store.merge(key.clone(), partial);
            ctx.changes.absorb(notice);
            ctx.touched.insert(key.clone());
            FieldValue::Reference(key)
        }
        Identity::Inline => FieldValue::Object(shaped_record(store, object, shape, ctx)),
    }
}

/// Build a record from the selected fields, keeping the identity field even
/// when the shape did not select it.
fn shaped_record<S: RecordStore>(
    store: &mut S,
    object: &RawObject,
    shape: &QueryShape,
    ctx: &mut WriteContext,
) -> StoreRecord {
    let mut record = StoreRecord::new();
    for selection in &shape.selections {
        if let Some(value) = object.get(&selection.name) {
            record.set(
                selection.name.clone(),
                normalize_value(store, value, selection.subshape.as_ref(), ctx),
            );
        }
    }
    for id_field in ID_FIELDS {
        if !record.contains_field(id_field) {
            if let Some(RawValue::Scalar(id)) = object.get(id_field) {
                record.set(id_field, FieldValue::Scalar(id.clone()));
            }
        }
    }
    record
}

/// Embed an object with all of its substructure inline, extracting nothing.
fn embed_verbatim(object: &RawObject) -> StoreRecord {
    let mut record = StoreRecord::new();
    for (name, value) in object.fields() {
        record.set(name.clone(), verbatim_value(value));
    }
    record
}

fn verbatim_value(value: &RawValue) -> FieldValue {
    match value {
        RawValue::Scalar(scalar) => FieldValue::Scalar(scalar.clone()),
        RawValue::List(items) => {
            FieldValue::List(items.iter().map(verbatim_value).collect())
        }
        RawValue::Object(object) => FieldValue::Object(embed_verbatim(object)),
    }
}
