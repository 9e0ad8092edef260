// ── HTML rendering ──
//
// Table-row rendering for embedding the voucher and sales lists in a
// page. Every backend-provided string is escaped; row actions carry
// `data-action` / `data-id` so a single delegated handler can dispatch
// them by `ActionKey`.

use std::fmt::Write as _;

use crate::command::RowAction;
use crate::model::{Sale, Voucher};

/// Escape the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn cell(out: &mut String, value: &str) {
    let _ = write!(out, "<td>{}</td>", escape_html(value));
}

fn action_button(out: &mut String, action: RowAction, id: &str) {
    let _ = write!(
        out,
        r#"<button data-action="{}" data-id="{}">{}</button>"#,
        action.as_str(),
        escape_html(id),
        action.label()
    );
}

/// `<tr>` rows for the voucher table.
///
/// Unused vouchers get a mark-used action; every row gets resend and
/// delete.
pub fn voucher_rows<'a>(vouchers: impl IntoIterator<Item = &'a Voucher>) -> String {
    let mut out = String::new();
    for voucher in vouchers {
        let id = voucher.id.to_string();
        let _ = write!(out, r#"<tr data-id="{}">"#, escape_html(&id));
        cell(&mut out, &id);
        cell(&mut out, &voucher.serial);
        cell(&mut out, &voucher.pin);
        cell(&mut out, voucher.kind.as_deref().unwrap_or(""));
        cell(&mut out, voucher.status_label());
        cell(&mut out, voucher.reference.as_deref().unwrap_or(""));
        cell(&mut out, voucher.date_used.as_deref().unwrap_or(""));
        out.push_str("<td>");
        for action in RowAction::available_for(voucher) {
            action_button(&mut out, action, &id);
        }
        out.push_str("</td></tr>\n");
    }
    out
}

/// `<tr>` rows for the sales table.
pub fn sales_rows<'a>(sales: impl IntoIterator<Item = &'a Sale>) -> String {
    let mut out = String::new();
    for sale in sales {
        out.push_str("<tr>");
        cell(&mut out, sale.name.as_deref().unwrap_or(""));
        cell(&mut out, sale.phone.as_deref().unwrap_or(""));
        cell(&mut out, sale.email.as_deref().unwrap_or(""));
        cell(&mut out, &sale.voucher_display());
        cell(&mut out, sale.reference.as_deref().unwrap_or(""));
        cell(&mut out, sale.date.as_deref().unwrap_or(""));
        out.push_str("</tr>\n");
    }
    out
}

/// A complete `<table>` with a header row.
pub fn table(headers: &[&str], rows: &str) -> String {
    let mut out = String::from("<table>\n<thead><tr>");
    for header in headers {
        let _ = write!(out, "<th>{}</th>", escape_html(header));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    out.push_str(rows);
    out.push_str("</tbody>\n</table>\n");
    out
}

pub const VOUCHER_TABLE_HEADERS: [&str; 8] = [
    "ID", "Serial", "PIN", "Type", "Status", "Reference", "Used at", "Actions",
];
pub const SALES_TABLE_HEADERS: [&str; 6] = ["Name", "Phone", "Email", "Voucher", "Reference", "Date"];

/// Full voucher table.
pub fn voucher_table<'a>(vouchers: impl IntoIterator<Item = &'a Voucher>) -> String {
    table(&VOUCHER_TABLE_HEADERS, &voucher_rows(vouchers))
}

/// Full sales table.
pub fn sales_table<'a>(sales: impl IntoIterator<Item = &'a Sale>) -> String {
    table(&SALES_TABLE_HEADERS, &sales_rows(sales))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VoucherId;

    #[test]
    fn escapes_all_five_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(escape_html("SN-0001 PIN 4455"), "SN-0001 PIN 4455");
    }

    #[test]
    fn escaping_is_not_idempotent_on_entities() {
        assert_eq!(escape_html("&amp;"), "&amp;amp;");
    }

    #[test]
    fn voucher_row_escapes_and_carries_actions() {
        let voucher = Voucher {
            id: VoucherId::Text("v<1>".into()),
            serial: "<script>alert(1)</script>".into(),
            pin: "12\"34".into(),
            kind: Some("WASSCE".into()),
            used: false,
            reference: None,
            date_used: None,
            phone: None,
            email: None,
        };
        let html = voucher_rows([&voucher]);
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("12&quot;34"));
        assert!(html.contains(r#"data-action="mark-used" data-id="v&lt;1&gt;""#));
        assert!(html.contains(r#"data-action="delete""#));
    }

    #[test]
    fn used_voucher_has_no_mark_used_action() {
        let voucher = Voucher {
            id: VoucherId::Numeric(2),
            serial: "S".into(),
            pin: "P".into(),
            kind: None,
            used: true,
            reference: None,
            date_used: None,
            phone: None,
            email: None,
        };
        let html = voucher_rows([&voucher]);
        assert!(!html.contains("mark-used"));
        assert!(html.contains(r#"data-action="resend" data-id="2""#));
    }
}
