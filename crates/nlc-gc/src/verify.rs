//! Verification utilities for sweep safety.

use crate::collector::Collector;
use nlc_core::identity::EntityKey;
use nlc_store::RecordStore;
use std::collections::BTreeSet;

/// Post-sweep sanity checks.
pub struct SweepVerifier;

impl SweepVerifier {
    /// Verify that every live record is reachable from `roots` (plus the
    /// collector's retain list) - i.e. the sweep left no garbage behind.
    pub fn verify_no_leaks<S, I>(
        store: &S,
        collector: &Collector,
        roots: I,
    ) -> Result<(), String>
    where
        S: RecordStore,
        I: IntoIterator<Item = EntityKey>,
    {
        let reached = collector.reachable(store, roots);
        let leaked: Vec<String> = store
            .all_keys()
            .into_iter()
            .filter(|key| !reached.contains(key))
            .map(|key| key.to_string())
            .collect();

        if leaked.is_empty() {
            Ok(())
        } else {
            Err(format!("Unreachable live records survived: {:?}", leaked))
        }
    }

    /// Verify that every key in `expected_live` still holds a live record.
    pub fn verify_preserved<S>(
        store: &S,
        expected_live: &BTreeSet<EntityKey>,
    ) -> Result<(), String>
    where
        S: RecordStore,
    {
        for key in expected_live {
            if !store.contains(key) {
                return Err(format!("Reachable record was collected: {}", key));
            }
        }
        Ok(())
    }
}
