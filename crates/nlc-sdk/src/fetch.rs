//! Fetch collaborator abstraction.
//!
//! The cache never builds or sends requests itself; it normalizes whatever
//! raw data the injected fetcher eventually produces. Repeated fetches for
//! the same (shape, arguments) pair are not deduplicated here - that
//! policy, if wanted, belongs to the caller.

use async_trait::async_trait;
use nlc_core::raw::RawObject;
use nlc_core::shape::{Arguments, QueryShape};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Error produced by a fetch collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchError {
    /// The collaborator failed outright.
    Failed(String),
    /// The collaborator did not answer in time.
    Timeout,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Failed(e) => write!(f, "Fetch failed: {}", e),
            FetchError::Timeout => write!(f, "Fetch timed out"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Abstract fetch collaborator.
#[async_trait]
pub trait QueryFetcher: Send + Sync + 'static {
    /// Resolve a query shape with arguments into a raw root object.
    async fn fetch(&self, shape: &QueryShape, args: &Arguments)
        -> Result<RawObject, FetchError>;
}

/// In-memory fetcher with canned responses, keyed by canonical arguments
/// (for testing).
#[derive(Default)]
pub struct MemoryFetcher {
    responses: RwLock<HashMap<String, Result<RawObject, FetchError>>>,
    calls: AtomicUsize,
}

impl MemoryFetcher {
    /// Create an empty fetcher. Unconfigured argument sets fail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Can a successful response for an argument set.
    pub fn respond_with(&self, args: &Arguments, result: RawObject) {
        self.responses
            .write()
            .insert(args.canonical(), Ok(result));
    }

    /// Can a failure for an argument set.
    pub fn fail_with(&self, args: &Arguments, error: FetchError) {
        self.responses
            .write()
            .insert(args.canonical(), Err(error));
    }

    /// Number of fetches served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Acquire)
    }
}

#[async_trait]
impl QueryFetcher for MemoryFetcher {
    async fn fetch(
        &self,
        _shape: &QueryShape,
        args: &Arguments,
    ) -> Result<RawObject, FetchError> {
        self.calls.fetch_add(1, Ordering::AcqRel);
        self.responses
            .read()
            .get(&args.canonical())
            .cloned()
            .unwrap_or_else(|| {
                Err(FetchError::Failed(format!(
                    "no canned response for {}",
                    args
                )))
            })
    }
}
