//! Mark-and-sweep collection of unreachable store entries.

use nlc_core::identity::EntityKey;
use nlc_store::{ChangeNotice, RecordStore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

/// Evict a single key immediately.
///
/// The slot is tombstoned: later reads of references to it yield missing,
/// and the returned notice re-delivers any subscription that depended on
/// it. Store data reachable only through the evicted record stays put
/// until a sweep.
pub fn evict<S: RecordStore>(store: &mut S, key: &EntityKey) -> ChangeNotice {
    store.delete(key)
}

/// Result of one sweep.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GcResult {
    /// Live records that were removed, in key order.
    pub removed: Vec<EntityKey>,
    /// Change notice covering exactly the removed live records.
    pub notice: ChangeNotice,
    /// Number of slots examined (live and tombstoned).
    pub scanned: usize,
}

impl GcResult {
    /// An empty result (nothing swept).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of live records removed.
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }
}

/// Reachability collector.
///
/// Roots are the dependency sets of live subscriptions; the collector
/// closes them transitively through references, including references
/// nested inside inline objects and lists, and purges everything outside
/// the closure. Keys on the retain list survive unconditionally.
#[derive(Clone, Debug, Default)]
pub struct Collector {
    retained: BTreeSet<EntityKey>,
}

impl Collector {
    /// Create a collector with an empty retain list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a key as retained (never collected).
    pub fn preserve(&mut self, key: EntityKey) {
        self.retained.insert(key);
    }

    /// Clear the retain list.
    pub fn clear_preserved(&mut self) {
        self.retained.clear();
    }

    /// The current retain list.
    pub fn retained(&self) -> &BTreeSet<EntityKey> {
        &self.retained
    }

    /// Compute the set of keys reachable from `roots` plus the retain
    /// list, walking references transitively through the current store.
    pub fn reachable<S, I>(&self, store: &S, roots: I) -> BTreeSet<EntityKey>
    where
        S: RecordStore,
        I: IntoIterator<Item = EntityKey>,
    {
        let mut reached = BTreeSet::new();
        let mut queue: VecDeque<EntityKey> = roots
            .into_iter()
            .chain(self.retained.iter().cloned())
            .collect();

        while let Some(key) = queue.pop_front() {
            if !reached.insert(key.clone()) {
                continue;
            }
            if let Some(record) = store.get(&key) {
                let mut refs = Vec::new();
                record.collect_references(&mut refs);
                queue.extend(refs);
            }
        }

        reached
    }

    /// Sweep: purge every slot not reachable from `roots`.
    ///
    /// Unreachable live records are removed with a change notice;
    /// unreachable tombstones are dropped silently (their observable value
    /// was already missing). Idempotent: a second sweep with no
    /// intervening writes removes nothing.
    pub fn sweep<S, I>(&self, store: &mut S, roots: I) -> GcResult
    where
        S: RecordStore,
        I: IntoIterator<Item = EntityKey>,
    {
        let reached = self.reachable(store, roots);
        let slots = store.all_slots();

        let mut result = GcResult {
            removed: Vec::new(),
            notice: ChangeNotice::empty(),
            scanned: slots.len(),
        };

        for key in slots {
            if reached.contains(&key) {
                continue;
            }
            if store.purge(&key) {
                result.notice.record(key.clone());
                result.removed.push(key);
            }
        }

        result
    }
}
