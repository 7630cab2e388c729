//! Error types for the cache SDK.

use crate::fetch::FetchError;
use nlc_norm::ShapeError;
use std::fmt;

/// Error type for cache operations.
///
/// Absence of data is never an error - it reads as missing. These cover
/// the failure paths that actually reach a caller or an observer.
#[derive(Clone, Debug)]
pub enum CacheError {
    /// The fetch collaborator failed; the subscription stays active.
    Fetch(FetchError),
    /// The query shape is structurally invalid; rejected at subscribe time.
    MalformedShape(ShapeError),
    /// The handle does not name a live subscription.
    SubscriptionNotFound(String),
    /// The cache was reset while the subscription was still active.
    Cancelled,
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Fetch(e) => write!(f, "Fetch failed: {}", e),
            CacheError::MalformedShape(e) => write!(f, "Malformed query shape: {}", e),
            CacheError::SubscriptionNotFound(id) => {
                write!(f, "Subscription not found: {}", id)
            }
            CacheError::Cancelled => write!(f, "Subscription cancelled by cache reset"),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<FetchError> for CacheError {
    fn from(error: FetchError) -> Self {
        CacheError::Fetch(error)
    }
}

impl From<ShapeError> for CacheError {
    fn from(error: ShapeError) -> Self {
        CacheError::MalformedShape(error)
    }
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
