// ── Reactive entity streams ──
//
// Subscription handles for consuming DataStore changes.

mod filter;

use std::sync::Arc;

use tokio::sync::watch;

pub use filter::{StatusFilter, VoucherFilter};

/// A subscription to one collection in the store.
///
/// `current()` is the snapshot taken when the stream was created, or at
/// the last `changed()`.
pub struct EntityStream<T: Clone + Send + Sync + 'static> {
    current: Arc<Vec<Arc<T>>>,
    receiver: watch::Receiver<Arc<Vec<Arc<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> EntityStream<T> {
    pub(crate) fn new(receiver: watch::Receiver<Arc<Vec<Arc<T>>>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    pub fn current(&self) -> &Arc<Vec<Arc<T>>> {
        &self.current
    }

    /// Wait for the next replacement of the collection.
    /// Returns `None` once the store is dropped.
    pub async fn changed(&mut self) -> Option<Arc<Vec<Arc<T>>>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }
}
