//! Change notices emitted by store mutations.

use nlc_core::identity::EntityKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The set of keys whose stored data changed in one mutation.
///
/// Merges that write identical data and deletes of absent keys produce an
/// empty notice, which is what keeps repeated identical writes from
/// re-triggering subscriptions.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeNotice {
    changed: BTreeSet<EntityKey>,
}

impl ChangeNotice {
    /// An empty notice (nothing changed).
    pub fn empty() -> Self {
        Self::default()
    }

    /// A notice for a single changed key.
    pub fn single(key: EntityKey) -> Self {
        let mut changed = BTreeSet::new();
        changed.insert(key);
        Self { changed }
    }

    /// Record a changed key.
    pub fn record(&mut self, key: EntityKey) {
        self.changed.insert(key);
    }

    /// Absorb another notice.
    pub fn absorb(&mut self, other: ChangeNotice) {
        self.changed.extend(other.changed);
    }

    /// Whether any key changed.
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    /// Whether a specific key changed.
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.changed.contains(key)
    }

    /// The changed keys.
    pub fn changed_keys(&self) -> impl Iterator<Item = &EntityKey> {
        self.changed.iter()
    }

    /// Number of changed keys.
    pub fn len(&self) -> usize {
        self.changed.len()
    }
}

impl FromIterator<EntityKey> for ChangeNotice {
    fn from_iter<I: IntoIterator<Item = EntityKey>>(iter: I) -> Self {
        Self {
            changed: iter.into_iter().collect(),
        }
    }
}
