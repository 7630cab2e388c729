//! Subscription identity, handles and delivery gating.
//!
//! A subscription moves `Active -> (re-delivered)* -> Unsubscribed` and the
//! terminal transition is one-way. Deliveries are computed under the cache
//! state lock but dispatched outside it; the per-subscription gate keeps
//! them strictly ordered and the active flag - checked at delivery time,
//! not at dependency-computation time - guarantees silence after
//! unsubscribe returns.

use crate::error::CacheError;
use crate::observer::QueryObserver;
use nlc_norm::ResultValue;
use parking_lot::ReentrantMutex;
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use ulid::Ulid;

/// Unique identifier for a subscription.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(Ulid);

impl SubscriptionId {
    /// Issue a fresh id.
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-subscription delivery gate: the epoch of the last dispatched
/// delivery, behind a reentrant lock so an observer callback can
/// unsubscribe itself without deadlocking.
pub(crate) type DeliveryGate = Arc<ReentrantMutex<Cell<u64>>>;

pub(crate) fn new_gate() -> DeliveryGate {
    Arc::new(ReentrantMutex::new(Cell::new(0)))
}

/// Handle returned by `subscribe`, used to unsubscribe or refetch.
#[derive(Clone)]
pub struct WatchHandle {
    pub(crate) id: SubscriptionId,
    pub(crate) active: Arc<AtomicBool>,
}

impl WatchHandle {
    /// The subscription's id.
    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }

    /// Whether the subscription has not been unsubscribed or cancelled.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("id", &self.id.to_string())
            .field("active", &self.is_active())
            .finish()
    }
}

/// A delivery computed under the state lock, dispatched after it drops.
pub(crate) struct Delivery {
    pub observer: Arc<dyn QueryObserver>,
    pub active: Arc<AtomicBool>,
    pub gate: DeliveryGate,
    pub epoch: u64,
    pub value: ResultValue,
}

impl Delivery {
    /// Dispatch unless the subscription went inactive or a newer delivery
    /// already went out.
    pub fn dispatch(self) {
        let gate = self.gate.lock();
        if self.epoch <= gate.get() {
            return;
        }
        if !self.active.load(Ordering::Acquire) {
            return;
        }
        gate.set(self.epoch);
        self.observer.on_next(self.value);
    }
}

/// A fetch error computed for a subscription, dispatched the same way.
pub(crate) struct ErrorDelivery {
    pub observer: Arc<dyn QueryObserver>,
    pub active: Arc<AtomicBool>,
    pub gate: DeliveryGate,
    pub error: CacheError,
}

impl ErrorDelivery {
    /// Dispatch unless the subscription went inactive.
    pub fn dispatch(self) {
        let _gate = self.gate.lock();
        if !self.active.load(Ordering::Acquire) {
            return;
        }
        self.observer.on_error(self.error);
    }
}
