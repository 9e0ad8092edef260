// ── DataStore ──
//
// Single source of truth shared by the console and its front ends.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::collection::EntityCollection;
use crate::model::{Sale, Voucher, VoucherStats};
use crate::stream::EntityStream;

/// Reactive storage for vouchers, sales and stats.
pub struct DataStore {
    vouchers: EntityCollection<Voucher>,
    sales: EntityCollection<Sale>,
    stats: watch::Sender<Option<VoucherStats>>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl DataStore {
    pub fn new() -> Self {
        let (stats, _) = watch::channel(None);
        let (last_refresh, _) = watch::channel(None);
        Self {
            vouchers: EntityCollection::new(),
            sales: EntityCollection::new(),
            stats,
            last_refresh,
        }
    }

    // ── Mutation ─────────────────────────────────────────────────────

    pub(crate) fn replace_vouchers(&self, vouchers: Vec<Voucher>) {
        let items = vouchers.into_iter().map(|v| (v.key(), v)).collect();
        self.vouchers.replace_all(items);
        self.touch();
    }

    pub(crate) fn replace_sales(&self, sales: Vec<Sale>) {
        let items = sales
            .into_iter()
            .enumerate()
            .map(|(i, s)| {
                let key = s
                    .id
                    .as_ref()
                    .map(ToString::to_string)
                    .or_else(|| s.reference.clone())
                    .unwrap_or_else(|| format!("#{i}"));
                (key, s)
            })
            .collect();
        self.sales.replace_all(items);
        self.touch();
    }

    pub(crate) fn set_stats(&self, stats: VoucherStats) {
        self.stats.send_replace(Some(stats));
        self.touch();
    }

    pub(crate) fn remove_voucher(&self, key: &str) -> Option<Arc<Voucher>> {
        self.vouchers.remove(key)
    }

    /// Forget everything (logout).
    pub(crate) fn clear(&self) {
        self.vouchers.clear();
        self.sales.clear();
        self.stats.send_replace(None);
        self.last_refresh.send_replace(None);
    }

    fn touch(&self) {
        self.last_refresh.send_replace(Some(Utc::now()));
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn vouchers_snapshot(&self) -> Arc<Vec<Arc<Voucher>>> {
        self.vouchers.snapshot()
    }

    pub fn sales_snapshot(&self) -> Arc<Vec<Arc<Sale>>> {
        self.sales.snapshot()
    }

    pub fn stats(&self) -> Option<VoucherStats> {
        *self.stats.borrow()
    }

    pub fn voucher(&self, key: &str) -> Option<Arc<Voucher>> {
        self.vouchers.get(key)
    }

    pub fn voucher_count(&self) -> usize {
        self.vouchers.len()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_vouchers(&self) -> EntityStream<Voucher> {
        EntityStream::new(self.vouchers.subscribe())
    }

    pub fn subscribe_sales(&self) -> EntityStream<Sale> {
        EntityStream::new(self.sales.subscribe())
    }

    pub fn subscribe_stats(&self) -> watch::Receiver<Option<VoucherStats>> {
        self.stats.subscribe()
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::model::VoucherId;

    fn voucher(id: i64, serial: &str) -> Voucher {
        Voucher {
            id: VoucherId::Numeric(id),
            serial: serial.into(),
            pin: "0000".into(),
            kind: None,
            used: false,
            reference: None,
            date_used: None,
            phone: None,
            email: None,
        }
    }

    #[tokio::test]
    async fn subscribers_see_replacement() {
        let store = DataStore::new();
        let mut stream = store.subscribe_vouchers();
        assert!(stream.current().is_empty());

        store.replace_vouchers(vec![voucher(1, "A"), voucher(2, "B")]);

        let snap = stream.changed().await.unwrap();
        assert_eq!(snap.len(), 2);
        assert_eq!(store.voucher("2").unwrap().serial, "B");
        assert!(store.last_refresh().is_some());
    }

    #[test]
    fn clear_resets_everything() {
        let store = DataStore::new();
        store.replace_vouchers(vec![voucher(1, "A")]);
        store.clear();
        assert_eq!(store.voucher_count(), 0);
        assert!(store.stats().is_none());
        assert!(store.last_refresh().is_none());
    }
}
