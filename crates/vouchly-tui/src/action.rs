//! UI actions. Every state change in the TUI goes through one of these.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use vouchly_core::{ActionKey, RowAction, Sale, SessionState, Voucher, VoucherFilter, VoucherStats};

use crate::screen::ScreenId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A toast shown in the bottom-right corner for a few seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Warning,
        }
    }
}

/// A row action waiting for y/n.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirm {
    pub key: ActionKey,
    /// Serial shown in the prompt.
    pub serial: String,
}

impl PendingConfirm {
    pub fn new(action: RowAction, voucher: &Voucher) -> Self {
        Self {
            key: ActionKey::new(action, voucher.id.clone()),
            serial: voucher.serial.clone(),
        }
    }
}

impl fmt::Display for PendingConfirm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key.action.confirm_prompt(&self.serial))
    }
}

/// Which input form an overlay collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    AddVoucher,
    ImportCsv,
}

/// Which list an export writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Vouchers,
    Sales,
}

#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ───────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Navigation ──────────────────────────────────────────────────
    SwitchScreen(ScreenId),
    GoBack,
    ToggleHelp,

    // ── Session ─────────────────────────────────────────────────────
    /// Result of a login attempt started by the login view.
    LoginFinished(Result<(), String>),
    SessionChanged(SessionState),
    Logout,

    // ── Data (from the store) ───────────────────────────────────────
    VouchersUpdated(Arc<Vec<Arc<Voucher>>>),
    SalesUpdated(Arc<Vec<Arc<Sale>>>),
    StatsUpdated(VoucherStats),
    FilterChanged(VoucherFilter),
    Refresh,
    RefreshFinished,

    // ── Voucher list ────────────────────────────────────────────────
    /// Make `filter` the console filter and re-fetch.
    ApplyFilter(VoucherFilter),
    RequestRowAction(RowAction, Arc<Voucher>),
    ConfirmYes,
    ConfirmNo,
    OpenForm(FormKind),
    CloseForm,
    AddVoucher {
        serial: String,
        pin: String,
        kind: Option<String>,
    },
    ImportFile(PathBuf),
    Export(ExportKind),

    // ── Search ──────────────────────────────────────────────────────
    OpenSearch,
    CloseSearch,
    SearchInput(String),
    SearchSubmit,

    // ── Notifications ───────────────────────────────────────────────
    Notify(Notification),
}

#[cfg(test)]
mod tests {
    use vouchly_core::VoucherId;

    use super::*;

    #[test]
    fn confirm_prompt_names_the_serial() {
        let voucher = Voucher {
            id: VoucherId::Numeric(3),
            serial: "WAE-3".into(),
            pin: "9".into(),
            kind: None,
            used: false,
            reference: None,
            date_used: None,
            phone: None,
            email: None,
        };
        let pending = PendingConfirm::new(RowAction::Delete, &voucher);
        assert_eq!(pending.key.to_string(), "delete:3");
        assert!(pending.to_string().starts_with("Delete voucher WAE-3?"));
    }
}
