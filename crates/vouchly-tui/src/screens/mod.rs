//! Screen implementations. Each screen is a top-level Component.

pub mod dashboard;
pub mod login;
pub mod sales;
pub mod vouchers;

use crate::component::Component;
use crate::screen::ScreenId;

/// Components for the tab bar. The login view is created by the app.
pub fn create_screens() -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (ScreenId::Dashboard, Box::new(dashboard::DashboardScreen::new())),
        (ScreenId::Vouchers, Box::new(vouchers::VouchersScreen::new())),
        (ScreenId::Sales, Box::new(sales::SalesScreen::new())),
    ]
}

/// Move a table cursor by `delta`, clamped to `0..len`.
pub(crate) fn move_index(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    current.saturating_add_signed(delta).min(len - 1)
}

/// Placeholder for missing optional values.
pub(crate) fn opt(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_owned(),
        _ => "─".into(),
    }
}
