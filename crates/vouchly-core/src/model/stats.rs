use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate voucher counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherStats {
    pub total: u64,
    pub unused: u64,
    pub used: u64,
    pub fetched_at: DateTime<Utc>,
}
