//! Record store trait and in-memory implementation.
//!
//! Deleted keys leave a tombstone: a reference to one still resolves, it
//! just reads as missing. The garbage collector purges slots (live or
//! tombstoned) outright once nothing reachable points at them.

use crate::notice::ChangeNotice;
use nlc_core::identity::EntityKey;
use nlc_core::value::StoreRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Storage for normalized records, keyed by entity key.
pub trait RecordStore {
    /// Get a live record. Tombstoned and absent keys both return `None`.
    fn get(&self, key: &EntityKey) -> Option<&StoreRecord>;

    /// Field-wise merge of a partial record into the slot for `key`,
    /// creating or reviving the slot as needed. The notice names `key`
    /// exactly when stored data actually changed.
    fn merge(&mut self, key: EntityKey, partial: StoreRecord) -> ChangeNotice;

    /// Tombstone the slot for `key`. The notice names `key` exactly when a
    /// live record was removed.
    fn delete(&mut self, key: &EntityKey) -> ChangeNotice;

    /// Drop the slot for `key` entirely, tombstone included. Returns `true`
    /// if live data was removed (callers emit notices for those).
    fn purge(&mut self, key: &EntityKey) -> bool;

    /// Whether `key` holds a live record.
    fn contains(&self, key: &EntityKey) -> bool;

    /// Whether `key` is tombstoned (deleted but not yet purged).
    fn is_tombstoned(&self, key: &EntityKey) -> bool;

    /// Snapshot of all live keys.
    fn all_keys(&self) -> BTreeSet<EntityKey>;

    /// Snapshot of all slot keys, tombstones included (for the sweep).
    fn all_slots(&self) -> BTreeSet<EntityKey>;

    /// Number of live records.
    fn len(&self) -> usize;

    /// Whether the store holds no live records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every slot.
    fn clear(&mut self);
}

/// A slot in the store: live data or a tombstone left by a delete.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum Slot {
    Live(StoreRecord),
    Tombstone,
}

/// In-memory implementation of [`RecordStore`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    slots: HashMap<EntityKey, Slot>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts of live and tombstoned slots.
    pub fn stats(&self) -> StoreStats {
        let mut stats = StoreStats {
            live: 0,
            tombstones: 0,
        };
        for slot in self.slots.values() {
            match slot {
                Slot::Live(_) => stats.live += 1,
                Slot::Tombstone => stats.tombstones += 1,
            }
        }
        stats
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &EntityKey) -> Option<&StoreRecord> {
        match self.slots.get(key) {
            Some(Slot::Live(record)) => Some(record),
            _ => None,
        }
    }

    fn merge(&mut self, key: EntityKey, partial: StoreRecord) -> ChangeNotice {
        match self.slots.get_mut(&key) {
            Some(Slot::Live(existing)) => {
                if existing.merge(partial) {
                    ChangeNotice::single(key)
                } else {
                    ChangeNotice::empty()
                }
            }
            // A merge into a tombstoned or absent slot makes the key
            // readable again, which is a change even if the partial is empty.
            _ => {
                self.slots.insert(key.clone(), Slot::Live(partial));
                ChangeNotice::single(key)
            }
        }
    }

    fn delete(&mut self, key: &EntityKey) -> ChangeNotice {
        match self.slots.get(key) {
            Some(Slot::Live(_)) => {
                self.slots.insert(key.clone(), Slot::Tombstone);
                ChangeNotice::single(key.clone())
            }
            _ => ChangeNotice::empty(),
        }
    }

    fn purge(&mut self, key: &EntityKey) -> bool {
        matches!(self.slots.remove(key), Some(Slot::Live(_)))
    }

    fn contains(&self, key: &EntityKey) -> bool {
        matches!(self.slots.get(key), Some(Slot::Live(_)))
    }

    fn is_tombstoned(&self, key: &EntityKey) -> bool {
        matches!(self.slots.get(key), Some(Slot::Tombstone))
    }

    fn all_keys(&self) -> BTreeSet<EntityKey> {
        self.slots
            .iter()
            .filter_map(|(key, slot)| match slot {
                Slot::Live(_) => Some(key.clone()),
                Slot::Tombstone => None,
            })
            .collect()
    }

    fn all_slots(&self) -> BTreeSet<EntityKey> {
        self.slots.keys().cloned().collect()
    }

    fn len(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot, Slot::Live(_)))
            .count()
    }

    fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Slot counts for debug introspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreStats {
    /// Live records.
    pub live: usize,
    /// Tombstoned slots awaiting a sweep.
    pub tombstones: usize,
}
