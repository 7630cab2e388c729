//! Eviction and garbage collection for the Opaline live cache.
//!
//! Eviction removes a single key outright; the collector does a
//! mark-and-sweep over the store, retaining only entries transitively
//! reachable from the dependency sets of live subscriptions (plus an
//! explicit retain list) and purging everything else, tombstones included.

pub mod collector;
pub mod verify;

pub use collector::{evict, Collector, GcResult};
pub use verify::SweepVerifier;
