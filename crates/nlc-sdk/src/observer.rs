//! Delivery interface for subscription results.

use crate::error::CacheError;
use nlc_norm::ResultValue;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Receives deliveries for one subscription.
///
/// `on_next` carries a freshly denormalized result; `on_error` carries a
/// fetch failure or a reset cancellation. Calling `unsubscribe` on the
/// owning cache from inside either callback is safe; other cache mutations
/// must not be performed re-entrantly from a callback.
pub trait QueryObserver: Send + Sync + 'static {
    /// A new denormalized result is available.
    fn on_next(&self, result: ResultValue);

    /// The subscription hit an error; see [`CacheError`] for which ones
    /// terminate it.
    fn on_error(&self, error: CacheError);
}

/// Events emitted by a channel-backed observer.
#[derive(Clone, Debug)]
pub enum QueryEvent {
    /// A delivered result.
    Next(ResultValue),
    /// A delivered error.
    Error(CacheError),
}

impl QueryEvent {
    /// Unwrap a `Next` event, panicking on an error event (test helper).
    pub fn into_result(self) -> ResultValue {
        match self {
            QueryEvent::Next(value) => value,
            QueryEvent::Error(error) => panic!("expected result, got error: {}", error),
        }
    }
}

/// Observer that forwards deliveries onto an unbounded channel.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<QueryEvent>,
}

impl ChannelObserver {
    /// Create an observer plus the receiving end of its channel.
    pub fn channel() -> (Arc<Self>, mpsc::UnboundedReceiver<QueryEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl QueryObserver for ChannelObserver {
    fn on_next(&self, result: ResultValue) {
        let _ = self.tx.send(QueryEvent::Next(result));
    }

    fn on_error(&self, error: CacheError) {
        let _ = self.tx.send(QueryEvent::Error(error));
    }
}
