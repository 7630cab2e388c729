//! Property-based tests for the core value and identity types.
//!
//! These verify the laws the rest of the cache relies on:
//! - merge is idempotent: applying the same partial twice changes nothing
//!   the second time
//! - merge reports `false` exactly when the stored data is unchanged
//! - canonical renderings are stable and type-distinguishing
//! - identity derivation is deterministic

use nlc_core::identity::{identify, EntityKey, Identity};
use nlc_core::raw::RawObject;
use nlc_core::shape::Arguments;
use nlc_core::value::{FieldValue, ScalarValue, StoreRecord};
use proptest::prelude::*;

fn scalar_strategy() -> impl Strategy<Value = ScalarValue> {
    prop_oneof![
        Just(ScalarValue::Null),
        any::<bool>().prop_map(ScalarValue::Bool),
        (-1000i64..1000).prop_map(ScalarValue::Int),
        "[a-z0-9:-]{0,12}".prop_map(ScalarValue::Str),
    ]
}

fn field_value_strategy() -> impl Strategy<Value = FieldValue> {
    let leaf = prop_oneof![
        scalar_strategy().prop_map(FieldValue::Scalar),
        ("[A-Z][a-z]{1,6}", "[a-z0-9]{1,8}").prop_map(|(t, id)| {
            FieldValue::Reference(EntityKey::entity(&t, &ScalarValue::Str(id)))
        }),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(FieldValue::List),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(|fields| {
                let mut record = StoreRecord::new();
                for (name, value) in fields {
                    record.set(name, value);
                }
                FieldValue::Object(record)
            }),
        ]
    })
}

fn record_strategy() -> impl Strategy<Value = StoreRecord> {
    prop::collection::btree_map("[a-z]{1,6}", field_value_strategy(), 0..6).prop_map(|fields| {
        let mut record = StoreRecord::new();
        for (name, value) in fields {
            record.set(name, value);
        }
        record
    })
}

proptest! {
    #[test]
    fn merge_is_idempotent(base in record_strategy(), partial in record_strategy()) {
        let mut once = base.clone();
        once.merge(partial.clone());

        let mut twice = once.clone();
        let changed_again = twice.merge(partial);

        prop_assert!(!changed_again);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn merge_of_self_changes_nothing(record in record_strategy()) {
        let mut merged = record.clone();
        prop_assert!(!merged.merge(record.clone()));
        prop_assert_eq!(merged, record);
    }

    #[test]
    fn merge_reports_change_iff_state_differs(
        base in record_strategy(),
        partial in record_strategy()
    ) {
        let mut merged = base.clone();
        let changed = merged.merge(partial);
        prop_assert_eq!(changed, merged != base);
    }

    #[test]
    fn scalar_canonical_is_stable(scalar in scalar_strategy()) {
        prop_assert_eq!(scalar.canonical(), scalar.canonical());
    }

    #[test]
    fn type_name_keeps_keys_apart(n in -1000i64..1000) {
        let user = EntityKey::entity("User", &ScalarValue::Int(n));
        let chat = EntityKey::entity("Chat", &ScalarValue::Int(n));
        prop_assert_ne!(user, chat);
        prop_assert_ne!(
            ScalarValue::Int(n).canonical(),
            ScalarValue::Str(n.to_string()).canonical()
        );
    }

    #[test]
    fn identity_is_deterministic(t in "[A-Z][a-z]{1,6}", id in "[a-z0-9-]{1,10}") {
        let object = RawObject::typed(t).with_scalar("id", id).with_scalar("name", "x");
        let first = identify(&object);
        let second = identify(&object);
        prop_assert_eq!(first.clone(), second);
        prop_assert!(matches!(first, Identity::Keyed(_)));
    }

    #[test]
    fn canonical_arguments_distinguish_values(
        a in "[a-z0-9]{1,8}",
        b in "[a-z0-9]{1,8}"
    ) {
        prop_assume!(a != b);
        let left = Arguments::none().with("id", a);
        let right = Arguments::none().with("id", b);
        prop_assert_ne!(left.canonical(), right.canonical());
    }
}
