//! Screen identifiers and tab-bar navigation.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenId {
    #[default]
    Dashboard,
    Vouchers,
    Sales,
    /// Full-frame login view. Not in the tab bar.
    Login,
}

impl ScreenId {
    /// Screens in tab-bar order.
    pub const ALL: [ScreenId; 3] = [Self::Dashboard, Self::Vouchers, Self::Sales];

    /// Number key for this screen; 0 for the login view.
    pub fn number(self) -> u8 {
        match self {
            Self::Dashboard => 1,
            Self::Vouchers => 2,
            Self::Sales => 3,
            Self::Login => 0,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Dashboard),
            2 => Some(Self::Vouchers),
            3 => Some(Self::Sales),
            _ => None,
        }
    }

    /// Next tab, wrapping.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous tab, wrapping.
    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Vouchers => "Vouchers",
            Self::Sales => "Sales",
            Self::Login => "Login",
        }
    }

    /// Whether `/` search applies to this screen.
    pub fn searchable(self) -> bool {
        matches!(self, Self::Vouchers | Self::Sales)
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_keys_round_trip() {
        for id in ScreenId::ALL {
            assert_eq!(ScreenId::from_number(id.number()), Some(id));
        }
        assert_eq!(ScreenId::from_number(0), None);
        assert_eq!(ScreenId::from_number(4), None);
    }

    #[test]
    fn tab_order_wraps() {
        assert_eq!(ScreenId::Sales.next(), ScreenId::Dashboard);
        assert_eq!(ScreenId::Dashboard.prev(), ScreenId::Sales);
        assert_eq!(ScreenId::Login.next(), ScreenId::Vouchers);
    }
}
