//! High-level cache client.
//!
//! All store and tracker mutations run under a single state lock - the
//! single-writer discipline that preserves per-subscription delivery
//! ordering. Observer callbacks run outside the lock, gated by the
//! subscription's active flag and delivery epoch, so unsubscribing from
//! inside a callback is safe.

use crate::error::{CacheError, Result};
use crate::fetch::QueryFetcher;
use crate::observer::QueryObserver;
use crate::subscription::{new_gate, Delivery, DeliveryGate, ErrorDelivery, SubscriptionId, WatchHandle};
use crate::tracker::DependencyTracker;
use nlc_core::identity::EntityKey;
use nlc_core::raw::RawObject;
use nlc_core::shape::{Arguments, QueryShape};
use nlc_core::value::StoreRecord;
use nlc_gc::{Collector, GcResult};
use nlc_norm::{read_query, validate_shape, write_query, ResultValue};
use nlc_store::{ChangeNotice, MemoryStore, RecordStore, StoreStats};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Configuration for the cache.
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Label used in diagnostics.
    pub label: String,
    /// Run a GC sweep automatically after every unsubscribe.
    pub auto_gc: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            label: "cache".to_string(),
            auto_gc: false,
        }
    }
}

/// Builder for cache configuration.
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: CacheConfig::default(),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.config.label = label.into();
        self
    }

    pub fn auto_gc(mut self, enabled: bool) -> Self {
        self.config.auto_gc = enabled;
        self
    }

    pub fn build(self) -> CacheConfig {
        self.config
    }
}

impl Default for CacheConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct SubEntry {
    shape: QueryShape,
    args: Arguments,
    observer: Arc<dyn QueryObserver>,
    active: Arc<AtomicBool>,
    gate: DeliveryGate,
    deps: BTreeSet<EntityKey>,
    last_value: Option<ResultValue>,
}

struct CacheState {
    store: MemoryStore,
    tracker: DependencyTracker,
    subs: HashMap<SubscriptionId, SubEntry>,
    epoch: u64,
}

impl CacheState {
    fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            tracker: DependencyTracker::new(),
            subs: HashMap::new(),
            epoch: 0,
        }
    }

    /// Re-read a subscription's query and stage a delivery for it, moving
    /// the tracker's edges to the new dependency set.
    ///
    /// The root record is shared by every argument-keyed root field, so a
    /// write for one subscription can touch another's dependency set
    /// without changing what it would see. A result identical to the last
    /// delivered one is therefore not re-delivered.
    fn redeliver(&mut self, id: &SubscriptionId) -> Option<Delivery> {
        let entry = self.subs.get_mut(id)?;
        if !entry.active.load(Ordering::Acquire) {
            return None;
        }
        let read = read_query(&self.store, &entry.shape, &entry.args);
        self.tracker.update(id, &entry.deps, &read.deps);
        entry.deps = read.deps;
        if entry.last_value.as_ref() == Some(&read.value) {
            return None;
        }
        entry.last_value = Some(read.value.clone());
        self.epoch += 1;
        Some(Delivery {
            observer: entry.observer.clone(),
            active: entry.active.clone(),
            gate: entry.gate.clone(),
            epoch: self.epoch,
            value: read.value,
        })
    }

    /// Stage re-deliveries for every subscription a notice affects.
    fn apply_notice(&mut self, notice: &ChangeNotice) -> Vec<Delivery> {
        let mut deliveries = Vec::new();
        for id in self.tracker.affected(notice) {
            if let Some(delivery) = self.redeliver(&id) {
                deliveries.push(delivery);
            }
        }
        deliveries
    }

    /// Dependency sets of all active subscriptions - the GC roots.
    fn gc_roots(&self) -> Vec<EntityKey> {
        self.subs
            .values()
            .filter(|entry| entry.active.load(Ordering::Acquire))
            .flat_map(|entry| entry.deps.iter().cloned())
            .collect()
    }
}

/// The normalized live cache.
///
/// Subscribing issues a fetch through the injected collaborator, normalizes
/// the result into the store, and delivers the denormalized view; any later
/// store mutation touching a key the subscription read re-delivers an
/// updated view. Unsubscribing ends liveness only - `evict` and `gc`
/// reclaim memory.
///
/// # Example
///
/// ```no_run
/// use nlc_core::shape::{Arguments, QueryShape};
/// use nlc_sdk::{Cache, CacheConfig, ChannelObserver, MemoryFetcher};
/// use std::sync::Arc;
///
/// # async fn example() {
/// let cache = Cache::new(Arc::new(MemoryFetcher::new()), CacheConfig::default());
///
/// let shape = QueryShape::new().object("chat", QueryShape::new().field("id"));
/// let args = Arguments::none().with("id", "c-1");
/// let (observer, mut events) = ChannelObserver::channel();
///
/// let handle = cache.subscribe(shape, args, observer).unwrap();
/// let first = events.recv().await;
/// cache.unsubscribe(&handle);
/// cache.gc();
/// # }
/// ```
pub struct Cache<F: QueryFetcher> {
    fetcher: Arc<F>,
    state: Arc<Mutex<CacheState>>,
    config: CacheConfig,
}

impl<F: QueryFetcher> Clone for Cache<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            state: self.state.clone(),
            config: self.config.clone(),
        }
    }
}

impl<F: QueryFetcher> Cache<F> {
    /// Create a cache around a fetch collaborator. Starts empty.
    pub fn new(fetcher: Arc<F>, config: CacheConfig) -> Self {
        Self {
            fetcher,
            state: Arc::new(Mutex::new(CacheState::new())),
            config,
        }
    }

    /// Subscribe to a query. Validates the shape, registers the
    /// subscription and spawns the initiating fetch; the first delivery
    /// arrives on the observer once the fetch completes.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe(
        &self,
        shape: QueryShape,
        args: Arguments,
        observer: Arc<dyn QueryObserver>,
    ) -> Result<WatchHandle> {
        validate_shape(&shape)?;

        let id = SubscriptionId::new();
        let active = Arc::new(AtomicBool::new(true));
        {
            let mut state = self.state.lock();
            state.subs.insert(
                id.clone(),
                SubEntry {
                    shape,
                    args,
                    observer,
                    active: active.clone(),
                    gate: new_gate(),
                    deps: BTreeSet::new(),
                    last_value: None,
                },
            );
        }
        tracing::debug!(cache = %self.config.label, subscription = %id, "subscribed");

        let cache = self.clone();
        let fetch_id = id.clone();
        tokio::spawn(async move {
            cache.run_fetch(fetch_id).await;
        });

        Ok(WatchHandle { id, active })
    }

    /// Unsubscribe. Removes the subscription's tracker edges and
    /// guarantees no further delivery for the handle once this returns;
    /// store data is left for `evict`/`gc`. A second call is a no-op.
    /// Safe to call from inside a delivery callback.
    pub fn unsubscribe(&self, handle: &WatchHandle) {
        let gate = {
            let mut state = self.state.lock();
            handle.active.store(false, Ordering::Release);
            match state.subs.remove(&handle.id) {
                Some(entry) => {
                    state.tracker.remove_subscription(&handle.id, &entry.deps);
                    Some(entry.gate)
                }
                None => None,
            }
        };
        // Wait out any delivery that already passed its active check. The
        // gate is reentrant, so unsubscribing from inside the callback
        // itself does not deadlock.
        if let Some(gate) = gate {
            drop(gate.lock());
            tracing::debug!(cache = %self.config.label, subscription = %handle.id, "unsubscribed");
            if self.config.auto_gc {
                self.gc();
            }
        }
    }

    /// Re-run the fetch for an active subscription (manual retry after a
    /// fetch error, or a forced refresh).
    pub fn refetch(&self, handle: &WatchHandle) -> Result<()> {
        {
            let state = self.state.lock();
            if !state.subs.contains_key(&handle.id) {
                return Err(CacheError::SubscriptionNotFound(handle.id.to_string()));
            }
        }
        let cache = self.clone();
        let id = handle.id.clone();
        tokio::spawn(async move {
            cache.run_fetch(id).await;
        });
        Ok(())
    }

    /// Evict a key outright. Subscriptions that depended on it re-deliver
    /// with a missing value in that position.
    pub fn evict(&self, key: &EntityKey) {
        let deliveries = {
            let mut state = self.state.lock();
            let notice = nlc_gc::evict(&mut state.store, key);
            tracing::debug!(cache = %self.config.label, %key, changed = !notice.is_empty(), "evict");
            state.apply_notice(&notice)
        };
        for delivery in deliveries {
            delivery.dispatch();
        }
    }

    /// Sweep the store, reclaiming everything unreachable from the
    /// dependency sets of active subscriptions. Idempotent.
    pub fn gc(&self) -> GcResult {
        let (result, deliveries) = {
            let mut state = self.state.lock();
            let roots = state.gc_roots();
            let result = Collector::new().sweep(&mut state.store, roots);
            // Collected keys were unreachable from every live dependency
            // set, so this stages nothing; kept for the invariant.
            let deliveries = state.apply_notice(&result.notice);
            (result, deliveries)
        };
        tracing::debug!(cache = %self.config.label, removed = result.removed_count(), "gc sweep");
        for delivery in deliveries {
            delivery.dispatch();
        }
        result
    }

    /// Clear the store and tracker and force-unsubscribe every
    /// subscription; each one still active receives a single cancellation
    /// error.
    pub fn reset(&self) {
        let cancelled: Vec<ErrorDelivery> = {
            let mut state = self.state.lock();
            state.store.clear();
            state.tracker.clear();
            state
                .subs
                .drain()
                .map(|(_, entry)| ErrorDelivery {
                    observer: entry.observer,
                    active: entry.active,
                    gate: entry.gate,
                    error: CacheError::Cancelled,
                })
                .collect()
        };
        tracing::debug!(cache = %self.config.label, cancelled = cancelled.len(), "reset");
        for delivery in cancelled {
            // The flag flips under the gate so the cancellation is the
            // final delivery each observer sees.
            let gate = delivery.gate.clone();
            let guard = gate.lock();
            if delivery.active.swap(false, Ordering::AcqRel) {
                delivery.observer.on_error(delivery.error);
            }
            drop(guard);
        }
    }

    /// Read-only snapshot of a stored record (debug introspection).
    pub fn get_record(&self, key: &EntityKey) -> Option<StoreRecord> {
        self.state.lock().store.get(key).cloned()
    }

    /// Number of live records in the store.
    pub fn store_len(&self) -> usize {
        self.state.lock().store.len()
    }

    /// Snapshot of all live store keys.
    pub fn store_keys(&self) -> BTreeSet<EntityKey> {
        self.state.lock().store.all_keys()
    }

    /// Live and tombstone slot counts.
    pub fn store_stats(&self) -> StoreStats {
        self.state.lock().store.stats()
    }

    /// Number of registered subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.state.lock().subs.len()
    }

    async fn run_fetch(&self, id: SubscriptionId) {
        let (shape, args, observer, active, gate) = {
            let state = self.state.lock();
            match state.subs.get(&id) {
                Some(entry) => (
                    entry.shape.clone(),
                    entry.args.clone(),
                    entry.observer.clone(),
                    entry.active.clone(),
                    entry.gate.clone(),
                ),
                None => return,
            }
        };
        if !active.load(Ordering::Acquire) {
            return;
        }

        match self.fetcher.fetch(&shape, &args).await {
            Ok(raw) => self.apply_fetch_result(&id, &raw),
            Err(error) => {
                tracing::debug!(cache = %self.config.label, subscription = %id, %error, "fetch failed");
                ErrorDelivery {
                    observer,
                    active,
                    gate,
                    error: CacheError::Fetch(error),
                }
                .dispatch();
            }
        }
    }

    /// Normalize a completed fetch and deliver: first to the subscription
    /// that fetched, then to every other subscription the write affected.
    fn apply_fetch_result(&self, id: &SubscriptionId, raw: &RawObject) {
        let deliveries = {
            let mut state = self.state.lock();
            let Some(entry) = state.subs.get(id) else {
                return;
            };
            let shape = entry.shape.clone();
            let args = entry.args.clone();
            let write = write_query(&mut state.store, &shape, &args, raw);
            tracing::debug!(
                cache = %self.config.label,
                subscription = %id,
                touched = write.touched.len(),
                changed = write.changes.len(),
                "fetch result written"
            );

            let mut affected = state.tracker.affected(&write.changes);
            affected.remove(id);

            let mut deliveries = Vec::new();
            if let Some(delivery) = state.redeliver(id) {
                deliveries.push(delivery);
            }
            for other in affected {
                if let Some(delivery) = state.redeliver(&other) {
                    deliveries.push(delivery);
                }
            }
            deliveries
        };
        for delivery in deliveries {
            delivery.dispatch();
        }
    }
}
