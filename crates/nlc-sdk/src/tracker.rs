//! Dependency tracker - the inverted key-to-subscription index.
//!
//! Owns no data: it is a derived index from store keys to the ids of
//! subscriptions whose last read visited them, updated incrementally after
//! every re-delivery so stale edges never accumulate.

use crate::subscription::SubscriptionId;
use nlc_core::identity::EntityKey;
use nlc_store::ChangeNotice;
use std::collections::{BTreeSet, HashMap};

/// Inverted index: key -> ids of subscriptions depending on it.
#[derive(Debug, Default)]
pub struct DependencyTracker {
    index: HashMap<EntityKey, BTreeSet<SubscriptionId>>,
}

impl DependencyTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscriptions affected by a change notice: the union of index
    /// lookups over every changed key, in id order.
    pub fn affected(&self, notice: &ChangeNotice) -> BTreeSet<SubscriptionId> {
        let mut ids = BTreeSet::new();
        for key in notice.changed_keys() {
            if let Some(subscribers) = self.index.get(key) {
                ids.extend(subscribers.iter().cloned());
            }
        }
        ids
    }

    /// Replace a subscription's dependency set, removing edges for keys it
    /// no longer reads and adding edges for the ones it now does.
    pub fn update(
        &mut self,
        id: &SubscriptionId,
        old: &BTreeSet<EntityKey>,
        new: &BTreeSet<EntityKey>,
    ) {
        for key in old.difference(new) {
            self.remove_edge(key, id);
        }
        for key in new.difference(old) {
            self.index.entry(key.clone()).or_default().insert(id.clone());
        }
    }

    /// Drop every edge for a subscription (on unsubscribe).
    pub fn remove_subscription(&mut self, id: &SubscriptionId, deps: &BTreeSet<EntityKey>) {
        for key in deps {
            self.remove_edge(key, id);
        }
    }

    /// Ids currently depending on a key.
    pub fn subscribers_of(&self, key: &EntityKey) -> BTreeSet<SubscriptionId> {
        self.index.get(key).cloned().unwrap_or_default()
    }

    /// Number of keys with at least one subscriber.
    pub fn tracked_key_count(&self) -> usize {
        self.index.len()
    }

    /// Whether no edges exist at all.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Drop every edge.
    pub fn clear(&mut self) {
        self.index.clear();
    }

    fn remove_edge(&mut self, key: &EntityKey, id: &SubscriptionId) {
        if let Some(subscribers) = self.index.get_mut(key) {
            subscribers.remove(id);
            if subscribers.is_empty() {
                self.index.remove(key);
            }
        }
    }
}
