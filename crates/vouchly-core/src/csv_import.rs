// ── Bulk CSV import ──
//
// Deliberately simple line/comma splitting: quoted fields are not
// supported. The first non-blank line names the columns.

use indexmap::IndexMap;
use vouchly_api::admin::UploadRow;

/// One data line mapped by header name.
pub type CsvRecord = IndexMap<String, String>;

/// Parse CSV text into header-keyed records.
///
/// Lines are split on `\n` (tolerating `\r\n`), blank lines are dropped,
/// header names and values are trimmed. Short rows yield empty strings for
/// the missing columns; extra values are ignored.
pub fn parse_csv(text: &str) -> Vec<CsvRecord> {
    let mut lines = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty());

    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_line
        .split(',')
        .map(|h| h.trim().to_owned())
        .collect();

    lines
        .map(|line| {
            let values: Vec<&str> = line.split(',').map(str::trim).collect();
            headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let value = values.get(i).copied().unwrap_or_default();
                    (header.clone(), value.to_owned())
                })
                .collect()
        })
        .collect()
}

fn field<'a>(record: &'a CsvRecord, name: &str) -> &'a str {
    record
        .iter()
        .find(|(header, _)| header.eq_ignore_ascii_case(name))
        .map_or("", |(_, value)| value.as_str())
}

/// Rows ready for upload plus what was dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportBatch {
    pub rows: Vec<UploadRow>,
    /// Records discarded for lacking a serial or PIN.
    pub skipped: usize,
}

impl ImportBatch {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Turn parsed records into upload rows.
///
/// `serial`, `pin` and `type` are looked up case-insensitively. Rows
/// without both serial and PIN are dropped; a missing type becomes
/// `default_type`, and every type is upper-cased.
pub fn prepare_upload(records: &[CsvRecord], default_type: &str) -> ImportBatch {
    let mut batch = ImportBatch::default();
    for record in records {
        let serial = field(record, "serial");
        let pin = field(record, "pin");
        if serial.is_empty() || pin.is_empty() {
            batch.skipped += 1;
            continue;
        }
        let kind = match field(record, "type") {
            "" => default_type,
            other => other,
        };
        batch.rows.push(UploadRow {
            serial: serial.to_owned(),
            pin: pin.to_owned(),
            kind: kind.to_uppercase(),
        });
    }
    batch
}

/// Parse and prepare in one step.
pub fn import_csv(text: &str, default_type: &str) -> ImportBatch {
    prepare_upload(&parse_csv(text), default_type)
}
