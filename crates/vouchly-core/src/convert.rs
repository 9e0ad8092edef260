// ── Wire → domain conversion ──
//
// Normalizes `vouchly-api` records into the canonical model. Missing
// identifiers fall back to the serial so every row has a stable key.

use chrono::Utc;
use vouchly_api::admin::{RawSale, RawVoucher, StatsCounts};

use crate::model::{Sale, Voucher, VoucherId, VoucherStats};

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

impl From<RawVoucher> for Voucher {
    fn from(raw: RawVoucher) -> Self {
        let used = raw.is_used();
        let serial = raw.serial.unwrap_or_default().trim().to_owned();
        let id = raw
            .id
            .map_or_else(|| VoucherId::Text(serial.clone()), VoucherId::from);

        Self {
            id,
            pin: raw.pin.unwrap_or_default().trim().to_owned(),
            serial,
            kind: clean(raw.kind),
            used,
            reference: clean(raw.reference),
            date_used: clean(raw.date_used),
            phone: clean(raw.phone),
            email: clean(raw.email),
        }
    }
}

impl From<RawSale> for Sale {
    fn from(raw: RawSale) -> Self {
        let date = raw.timestamp().map(str::to_owned);
        Self {
            id: raw.id.map(VoucherId::from),
            name: clean(raw.name),
            phone: clean(raw.phone),
            email: clean(raw.email),
            voucher_serial: clean(raw.voucher_serial),
            voucher_pin: clean(raw.voucher_pin),
            voucher: clean(raw.voucher),
            reference: clean(raw.reference),
            date,
        }
    }
}

impl From<StatsCounts> for VoucherStats {
    fn from(counts: StatsCounts) -> Self {
        Self {
            total: counts.total,
            unused: counts.unused,
            used: counts.used,
            fetched_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use vouchly_api::admin::{RawId, UsedFlag};

    use super::*;

    #[test]
    fn voucher_without_id_keys_on_serial() {
        let raw = RawVoucher {
            serial: Some(" SN-5 ".into()),
            pin: Some("1111".into()),
            used: Some(UsedFlag::Number(1)),
            reference: Some("  ".into()),
            ..RawVoucher::default()
        };
        let voucher = Voucher::from(raw);
        assert_eq!(voucher.id, VoucherId::Text("SN-5".into()));
        assert!(voucher.used);
        assert_eq!(voucher.reference, None);
    }

    #[test]
    fn sale_takes_first_timestamp() {
        let raw = RawSale {
            id: Some(RawId::Number(1)),
            created_at: Some("2024-05-01T10:00:00Z".into()),
            ..RawSale::default()
        };
        let sale = Sale::from(raw);
        assert_eq!(sale.date.as_deref(), Some("2024-05-01T10:00:00Z"));
        assert_eq!(sale.id, Some(VoucherId::Numeric(1)));
    }
}
