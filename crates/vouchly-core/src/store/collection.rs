// ── Ordered reactive collection ──
//
// Concurrent keyed storage with push-based change notification. Lists
// are always replaced wholesale after a fetch, so the snapshot keeps the
// order the backend returned.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

/// A reactive collection for a single entity type.
///
/// `DashMap` gives O(1) lookups by key; the `watch` channel carries the
/// ordered snapshot that subscribers render. Every mutation bumps the
/// version counter.
pub(crate) struct EntityCollection<T: Clone + Send + Sync + 'static> {
    by_key: DashMap<String, Arc<T>>,
    version: watch::Sender<u64>,
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_key: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Replace the whole collection, keeping `items` order.
    ///
    /// Later duplicates of a key win in the index but both rows stay in
    /// the snapshot, mirroring what the backend sent.
    pub(crate) fn replace_all(&self, items: Vec<(String, T)>) {
        self.by_key.clear();
        let mut ordered = Vec::with_capacity(items.len());
        for (key, item) in items {
            let item = Arc::new(item);
            self.by_key.insert(key, Arc::clone(&item));
            ordered.push(item);
        }
        self.snapshot.send_modify(|snap| *snap = Arc::new(ordered));
        self.bump_version();
    }

    /// Drop one entity by key. Returns it if present.
    pub(crate) fn remove(&self, key: &str) -> Option<Arc<T>> {
        let (_, removed) = self.by_key.remove(key)?;
        self.snapshot.send_modify(|snap| {
            let kept: Vec<Arc<T>> = snap
                .iter()
                .filter(|item| !Arc::ptr_eq(item, &removed))
                .cloned()
                .collect();
            *snap = Arc::new(kept);
        });
        self.bump_version();
        Some(removed)
    }

    pub(crate) fn get(&self, key: &str) -> Option<Arc<T>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn clear(&self) {
        self.replace_all(Vec::new());
    }

    pub(crate) fn len(&self) -> usize {
        self.snapshot.borrow().len()
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}
