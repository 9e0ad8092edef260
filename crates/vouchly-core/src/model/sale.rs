use std::fmt;

use serde::{Deserialize, Serialize};

use super::VoucherId;

/// A revealed voucher: the serial and PIN handed to a buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherCode {
    pub serial: String,
    pub pin: String,
}

impl VoucherCode {
    /// Parse the backend's `"<serial> | <pin>"` form.
    ///
    /// Returns `None` when the separator is missing or either half is
    /// empty after trimming.
    pub fn parse(raw: &str) -> Option<Self> {
        let (serial, pin) = raw.split_once('|')?;
        let (serial, pin) = (serial.trim(), pin.trim());
        if serial.is_empty() || pin.is_empty() {
            return None;
        }
        Some(Self {
            serial: serial.to_owned(),
            pin: pin.to_owned(),
        })
    }
}

impl fmt::Display for VoucherCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.serial, self.pin)
    }
}

/// A completed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: Option<VoucherId>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub voucher_serial: Option<String>,
    pub voucher_pin: Option<String>,
    /// Combined form when the backend did not split serial and PIN.
    pub voucher: Option<String>,
    pub reference: Option<String>,
    pub date: Option<String>,
}

impl Sale {
    /// `serial | pin` when both halves are known, else the combined form.
    pub fn voucher_display(&self) -> String {
        match (&self.voucher_serial, &self.voucher_pin) {
            (Some(serial), Some(pin)) => format!("{serial} | {pin}"),
            (Some(serial), None) => serial.clone(),
            _ => self.voucher.clone().unwrap_or_default(),
        }
    }

    /// Serial and PIN split out, falling back to parsing the combined form.
    pub fn voucher_code(&self) -> Option<VoucherCode> {
        match (&self.voucher_serial, &self.voucher_pin) {
            (Some(serial), Some(pin)) => Some(VoucherCode {
                serial: serial.clone(),
                pin: pin.clone(),
            }),
            _ => self.voucher.as_deref().and_then(VoucherCode::parse),
        }
    }
}
