use serde::{Deserialize, Serialize};

use super::VoucherId;

/// A result-checker voucher: serial + PIN, redeemable once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    pub id: VoucherId,
    pub serial: String,
    pub pin: String,
    /// Exam category, e.g. `WASSCE`, `BECE`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub used: bool,
    pub reference: Option<String>,
    pub date_used: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Voucher {
    pub fn status_label(&self) -> &'static str {
        if self.used { "used" } else { "unused" }
    }

    /// Stable store key.
    pub fn key(&self) -> String {
        self.id.to_string()
    }
}
