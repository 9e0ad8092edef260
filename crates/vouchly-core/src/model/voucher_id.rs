// ── Voucher identity ──
//
// SQL-backed deployments number their vouchers, document stores hand out
// string ids. Both are carried without loss and sent back verbatim.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vouchly_api::admin::RawId;

/// Identifier of a voucher or sale record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VoucherId {
    Numeric(i64),
    Text(String),
}

impl VoucherId {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Numeric(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// The wire form expected by the backend.
    pub fn to_raw(&self) -> RawId {
        match self {
            Self::Numeric(n) => RawId::Number(*n),
            Self::Text(s) => RawId::Text(s.clone()),
        }
    }
}

impl fmt::Display for VoucherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl FromStr for VoucherId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<&str> for VoucherId {
    /// Digit-only strings become numeric ids, everything else stays text.
    fn from(s: &str) -> Self {
        let trimmed = s.trim();
        match trimmed.parse::<i64>() {
            Ok(n) if !trimmed.starts_with('+') => Self::Numeric(n),
            _ => Self::Text(trimmed.to_owned()),
        }
    }
}

impl From<String> for VoucherId {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<i64> for VoucherId {
    fn from(n: i64) -> Self {
        Self::Numeric(n)
    }
}

impl From<RawId> for VoucherId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => Self::Numeric(n),
            RawId::Text(s) => Self::Text(s),
        }
    }
}
