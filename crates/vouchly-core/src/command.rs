// ── Command API ──
//
// Every write operation flows through the `Command` enum. Row actions in
// list views are identified by an `ActionKey` (`action:id`) instead of
// per-row closures, so a single dispatcher serves every row.

use std::fmt;
use std::str::FromStr;

use crate::csv_import::ImportBatch;
use crate::error::CoreError;
use crate::model::{Voucher, VoucherId};

// ── Row actions ──────────────────────────────────────────────────────

/// An action offered on a voucher row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowAction {
    MarkUsed,
    Delete,
    Resend,
}

impl RowAction {
    pub const ALL: [Self; 3] = [Self::MarkUsed, Self::Resend, Self::Delete];

    /// Stable attribute value (`data-action`, `action:id` prefix).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MarkUsed => "mark-used",
            Self::Delete => "delete",
            Self::Resend => "resend",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::MarkUsed => "Mark used",
            Self::Delete => "Delete",
            Self::Resend => "Resend",
        }
    }

    /// Actions that make sense for this voucher. Already-used vouchers
    /// cannot be marked used again.
    pub fn available_for(voucher: &Voucher) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|a| *a != Self::MarkUsed || !voucher.used)
            .collect()
    }

    /// Confirmation question shown before the action runs.
    pub fn confirm_prompt(self, voucher: &str) -> String {
        match self {
            Self::MarkUsed => format!("Mark voucher {voucher} as used?"),
            Self::Delete => format!("Delete voucher {voucher}? This cannot be undone."),
            Self::Resend => format!("Resend voucher {voucher} to its buyer?"),
        }
    }
}

impl fmt::Display for RowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RowAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "mark-used" => Ok(Self::MarkUsed),
            "delete" => Ok(Self::Delete),
            "resend" => Ok(Self::Resend),
            other => Err(CoreError::ValidationFailed {
                message: format!("unknown action '{other}'"),
            }),
        }
    }
}

/// `action:id` dispatch key for a row action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionKey {
    pub action: RowAction,
    pub id: VoucherId,
}

impl ActionKey {
    pub fn new(action: RowAction, id: VoucherId) -> Self {
        Self { action, id }
    }

    /// Build a key from `data-action` / `data-id` attribute values.
    pub fn from_attributes(action: &str, id: &str) -> Result<Self, CoreError> {
        if id.trim().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "missing voucher id".into(),
            });
        }
        Ok(Self {
            action: action.parse()?,
            id: VoucherId::from(id),
        })
    }

    /// The command this key dispatches to.
    pub fn into_command(self, buyer: Option<String>) -> Command {
        match self.action {
            RowAction::MarkUsed => Command::MarkUsed { id: self.id, buyer },
            RowAction::Delete => Command::DeleteVoucher { id: self.id },
            RowAction::Resend => Command::ResendVoucher { id: self.id },
        }
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.action, self.id)
    }
}

impl FromStr for ActionKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (action, id) = s.split_once(':').ok_or_else(|| CoreError::ValidationFailed {
            message: format!("expected action:id, got '{s}'"),
        })?;
        Self::from_attributes(action, id)
    }
}

// ── Commands ─────────────────────────────────────────────────────────

/// All write operations against the voucher backend.
#[derive(Debug, Clone)]
pub enum Command {
    AddVoucher {
        serial: String,
        pin: String,
        kind: Option<String>,
    },
    ImportVouchers {
        batch: ImportBatch,
        /// Name for the multipart file part.
        file_name: String,
    },
    MarkUsed {
        id: VoucherId,
        buyer: Option<String>,
    },
    MarkUsedBySerial {
        serial: String,
        buyer: Option<String>,
    },
    DeleteVoucher {
        id: VoucherId,
    },
    ResendVoucher {
        id: VoucherId,
    },
}

impl Command {
    /// Key used to reject a second identical submission while the first
    /// is still pending.
    pub fn in_flight_key(&self) -> String {
        match self {
            Self::AddVoucher { serial, .. } => format!("add:{}", serial.trim()),
            Self::ImportVouchers { .. } => "import".into(),
            Self::MarkUsed { id, .. } => ActionKey::new(RowAction::MarkUsed, id.clone()).to_string(),
            Self::MarkUsedBySerial { serial, .. } => {
                format!("mark-used:serial:{}", serial.trim())
            }
            Self::DeleteVoucher { id } => ActionKey::new(RowAction::Delete, id.clone()).to_string(),
            Self::ResendVoucher { id } => ActionKey::new(RowAction::Resend, id.clone()).to_string(),
        }
    }

    /// Whether a successful run should re-fetch the voucher list.
    pub fn reloads_list(&self) -> bool {
        !matches!(self, Self::ResendVoucher { .. })
    }

    /// Whether a successful run should re-fetch the aggregate counts.
    pub fn reloads_stats(&self) -> bool {
        !matches!(self, Self::ResendVoucher { .. })
    }
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Rows sent to the backend.
    pub attempted: usize,
    /// Rows dropped locally for lacking a serial or PIN.
    pub skipped: usize,
    /// Rows the backend reports as inserted, when it says.
    pub inserted: Option<u64>,
    pub message: Option<String>,
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uploaded {} row(s)", self.attempted)?;
        if let Some(inserted) = self.inserted {
            write!(f, ", {inserted} inserted")?;
        }
        if self.skipped > 0 {
            write!(f, ", {} skipped (missing serial or pin)", self.skipped)?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Ok { message: Option<String> },
    Imported(ImportReport),
}

impl CommandResult {
    /// Text for a success toast.
    pub fn summary(&self, fallback: &str) -> String {
        match self {
            Self::Ok { message } => message.clone().unwrap_or_else(|| fallback.to_owned()),
            Self::Imported(report) => report.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn action_key_round_trips_through_string() {
        let key: ActionKey = "mark-used:42".parse().unwrap();
        assert_eq!(key.action, RowAction::MarkUsed);
        assert_eq!(key.id, VoucherId::Numeric(42));
        assert_eq!(key.to_string(), "mark-used:42");
    }

    #[test]
    fn action_key_from_attributes_with_text_id() {
        let key = ActionKey::from_attributes("resend", "65af01").unwrap();
        assert!(matches!(
            key.into_command(None),
            Command::ResendVoucher { id: VoucherId::Text(ref s) } if s == "65af01"
        ));
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert!("mark-used".parse::<ActionKey>().is_err());
        assert!("explode:1".parse::<ActionKey>().is_err());
        assert!(ActionKey::from_attributes("delete", " ").is_err());
    }

    #[test]
    fn resend_does_not_reload() {
        let resend = Command::ResendVoucher { id: VoucherId::Numeric(1) };
        let delete = Command::DeleteVoucher { id: VoucherId::Numeric(1) };
        assert!(!resend.reloads_list());
        assert!(delete.reloads_list());
        assert_ne!(resend.in_flight_key(), delete.in_flight_key());
    }

    #[test]
    fn in_flight_key_ignores_surrounding_spaces() {
        let add = |serial: &str| Command::AddVoucher {
            serial: serial.into(),
            pin: "1".into(),
            kind: None,
        };
        assert_eq!(add(" WAS001 ").in_flight_key(), add("WAS001").in_flight_key());
        let by_serial = Command::MarkUsedBySerial { serial: "S1 ".into(), buyer: None };
        assert_eq!(by_serial.in_flight_key(), "mark-used:serial:S1");
    }

    #[test]
    fn import_report_summary() {
        let report = ImportReport {
            attempted: 3,
            skipped: 1,
            inserted: Some(2),
            message: None,
        };
        assert_eq!(
            report.to_string(),
            "Uploaded 3 row(s), 2 inserted, 1 skipped (missing serial or pin)"
        );
    }
}
