//! Normalized record storage for the Opaline live cache.
//!
//! The store is the single owner of all normalized field data. Merging and
//! deleting are the only mutation paths, and both emit a change notice
//! naming the keys whose data actually changed; the subscription layer
//! consumes those notices to decide which live queries to re-deliver.

pub mod notice;
pub mod store;

pub use notice::ChangeNotice;
pub use store::{MemoryStore, RecordStore, StoreStats};
