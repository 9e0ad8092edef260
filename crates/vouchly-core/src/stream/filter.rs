// ── Voucher list filtering ──
//
// Applied client-side to every fetched list, whether or not the backend
// already honoured the query parameters.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::model::Voucher;

/// Which vouchers to show by redemption state.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Used,
    Unused,
}

impl StatusFilter {
    /// Query-parameter value; `None` for `All`.
    pub fn as_query(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Used => Some("used"),
            Self::Unused => Some("unused"),
        }
    }

    /// Cycle `all → unused → used → all`.
    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Unused,
            Self::Unused => Self::Used,
            Self::Used => Self::All,
        }
    }

    pub fn matches(self, voucher: &Voucher) -> bool {
        match self {
            Self::All => true,
            Self::Used => voucher.used,
            Self::Unused => !voucher.used,
        }
    }
}

/// Status filter plus free-text search.
///
/// Search is a case-insensitive substring match over serial, PIN, buyer
/// phone and buyer email. An empty search matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoucherFilter {
    pub status: StatusFilter,
    search: String,
}

impl VoucherFilter {
    pub fn new(status: StatusFilter, search: impl Into<String>) -> Self {
        let mut filter = Self {
            status,
            search: String::new(),
        };
        filter.set_search(search);
        filter
    }

    /// The trimmed, lowercased search term.
    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into().trim().to_lowercase();
    }

    pub fn matches(&self, voucher: &Voucher) -> bool {
        if !self.status.matches(voucher) {
            return false;
        }
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.as_str();
        [
            Some(voucher.serial.as_str()),
            Some(voucher.pin.as_str()),
            voucher.phone.as_deref(),
            voucher.email.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
    }

    /// Filter a snapshot, preserving order.
    pub fn apply(&self, vouchers: &[Arc<Voucher>]) -> Vec<Arc<Voucher>> {
        vouchers
            .iter()
            .filter(|v| self.matches(v))
            .cloned()
            .collect()
    }
}
