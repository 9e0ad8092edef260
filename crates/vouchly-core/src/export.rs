// ── CSV export ──
//
// Every value is double-quoted with embedded quotes doubled.

use crate::model::{Sale, Voucher};

pub const VOUCHER_HEADERS: [&str; 6] = ["id", "serial", "pin", "type", "used", "reference"];
pub const SALES_HEADERS: [&str; 8] = [
    "id",
    "name",
    "phone",
    "email",
    "voucher_serial",
    "voucher_pin",
    "reference",
    "date",
];

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn render<const N: usize>(headers: [&str; N], rows: impl Iterator<Item = [String; N]>) -> String {
    let mut out = headers.join(",");
    for row in rows {
        out.push('\n');
        let line: Vec<String> = row.iter().map(|v| quote(v)).collect();
        out.push_str(&line.join(","));
    }
    out.push('\n');
    out
}

/// Render vouchers as CSV.
pub fn vouchers_csv<'a>(vouchers: impl IntoIterator<Item = &'a Voucher>) -> String {
    render(
        VOUCHER_HEADERS,
        vouchers.into_iter().map(|v| {
            [
                v.id.to_string(),
                v.serial.clone(),
                v.pin.clone(),
                v.kind.clone().unwrap_or_default(),
                v.used.to_string(),
                v.reference.clone().unwrap_or_default(),
            ]
        }),
    )
}

/// Render sales as CSV. A combined `"serial | pin"` is split into the two
/// voucher columns when possible.
pub fn sales_csv<'a>(sales: impl IntoIterator<Item = &'a Sale>) -> String {
    render(
        SALES_HEADERS,
        sales.into_iter().map(|s| {
            let (serial, pin) = match s.voucher_code() {
                Some(code) => (code.serial, code.pin),
                None => (
                    s.voucher_serial.clone().or_else(|| s.voucher.clone()).unwrap_or_default(),
                    s.voucher_pin.clone().unwrap_or_default(),
                ),
            };
            [
                s.id.as_ref().map(ToString::to_string).unwrap_or_default(),
                s.name.clone().unwrap_or_default(),
                s.phone.clone().unwrap_or_default(),
                s.email.clone().unwrap_or_default(),
                serial,
                pin,
                s.reference.clone().unwrap_or_default(),
                s.date.clone().unwrap_or_default(),
            ]
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VoucherId;

    #[test]
    fn voucher_export_quotes_and_escapes() {
        let voucher = Voucher {
            id: VoucherId::Numeric(1),
            serial: "SN\"1".into(),
            pin: "12,34".into(),
            kind: Some("WASSCE".into()),
            used: true,
            reference: None,
            date_used: None,
            phone: None,
            email: None,
        };
        insta::assert_snapshot!(vouchers_csv([&voucher]), @r#"
        id,serial,pin,type,used,reference
        "1","SN""1","12,34","WASSCE","true",""
        "#);
    }

    #[test]
    fn sales_export_splits_combined_voucher() {
        let sale = Sale {
            id: Some(VoucherId::Numeric(9)),
            name: Some("Kofi".into()),
            phone: Some("0200000000".into()),
            email: None,
            voucher_serial: None,
            voucher_pin: None,
            voucher: Some("S9 | P9".into()),
            reference: Some("ref-9".into()),
            date: Some("2024-06-01".into()),
        };
        let csv = sales_csv([&sale]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(SALES_HEADERS.join(",").as_str()));
        assert_eq!(
            lines.next(),
            Some(r#""9","Kofi","0200000000","","S9","P9","ref-9","2024-06-01""#)
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn empty_export_is_just_headers() {
        assert_eq!(vouchers_csv(std::iter::empty()), "id,serial,pin,type,used,reference\n");
    }
}
