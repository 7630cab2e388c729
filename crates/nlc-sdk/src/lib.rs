//! Opaline SDK - the caller-facing normalized live cache.
//!
//! A cache accepts declarative query shapes over graph-shaped data,
//! normalizes fetched results into a flat keyed store, and keeps every
//! subscriber's denormalized view live: any store mutation touching a key
//! a subscription read re-delivers an updated result. Unsubscribing ends
//! liveness; explicit eviction and the reachability GC reclaim memory.
//!
//! # Quick Start
//!
//! ```no_run
//! use nlc_core::shape::{Arguments, QueryShape};
//! use nlc_sdk::{Cache, CacheConfig, ChannelObserver, MemoryFetcher};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! // Create a cache around a fetch collaborator
//! let cache = Cache::new(Arc::new(MemoryFetcher::new()), CacheConfig::default());
//!
//! // Describe the data to watch
//! let shape = QueryShape::new().object(
//!     "chat",
//!     QueryShape::new().field("id").field("name"),
//! );
//! let args = Arguments::none().with("id", "c-1");
//!
//! // Subscribe; results arrive on the channel as the store changes
//! let (observer, mut events) = ChannelObserver::channel();
//! let handle = cache.subscribe(shape, args, observer).unwrap();
//! let first = events.recv().await;
//!
//! // Done watching: end liveness, then reclaim memory
//! cache.unsubscribe(&handle);
//! cache.gc();
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`client`] - the [`Cache`] itself: subscribe, unsubscribe, refetch,
//!   evict, gc, reset
//! - [`fetch`] - the fetch collaborator trait and an in-memory test double
//! - [`observer`] - the delivery interface and a channel-backed observer
//! - [`subscription`] - ids, handles and delivery gating
//! - [`tracker`] - the inverted key-to-subscription dependency index
//! - [`error`] - error types

pub mod client;
pub mod error;
pub mod fetch;
pub mod observer;
pub mod subscription;
pub mod tracker;

// Re-exports for convenience
pub use client::{Cache, CacheConfig, CacheConfigBuilder};
pub use error::{CacheError, Result};
pub use fetch::{FetchError, MemoryFetcher, QueryFetcher};
pub use observer::{ChannelObserver, QueryEvent, QueryObserver};
pub use subscription::{SubscriptionId, WatchHandle};
pub use tracker::DependencyTracker;

// Re-export commonly used types from the cache crates
pub use nlc_core::{
    identity::EntityKey,
    raw::{RawObject, RawValue},
    shape::{Arguments, QueryShape},
    value::{FieldValue, ScalarValue, StoreRecord},
};
pub use nlc_gc::GcResult;
pub use nlc_norm::{ResultValue, ShapeError};
pub use nlc_store::StoreStats;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::client::{Cache, CacheConfig};
    pub use crate::error::CacheError;
    pub use crate::fetch::{FetchError, QueryFetcher};
    pub use crate::observer::{ChannelObserver, QueryEvent, QueryObserver};
    pub use crate::subscription::WatchHandle;
    pub use nlc_core::identity::EntityKey;
    pub use nlc_core::raw::{RawObject, RawValue};
    pub use nlc_core::shape::{Arguments, QueryShape};
    pub use nlc_norm::ResultValue;
}
