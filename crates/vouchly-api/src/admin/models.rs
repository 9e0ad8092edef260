// Admin API wire types
//
// The voucher backend has been deployed in several shapes: list endpoints
// answer with `{vouchers: [...]}`, `{data: [...]}` or a bare array, and the
// used indicator arrives as a boolean, a 0/1 integer, or a `status` string.
// Scalar fields may come back as numbers (`"pin": 1234`) and lists as `null`.
// Every shape is accepted here and normalized before leaving this crate.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Identifiers ──────────────────────────────────────────────────────

/// A voucher or sale identifier as sent by the backend.
///
/// SQL-backed deployments send integers, document stores send strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ── Acknowledgements ─────────────────────────────────────────────────

/// Generic `{success, message, inserted}` acknowledgement.
///
/// A missing `success` field counts as success because the HTTP status
/// was already 2xx; an explicit `false` or a populated `error` field is
/// an application-level rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub inserted: Option<u64>,
}

impl Ack {
    /// An acknowledgement for an empty 2xx body.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.success.unwrap_or(true)
    }

    /// The most specific message available: `message`, then `error`.
    pub fn text(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }
}

// ── Login ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<&'a str>,
    pub password: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl LoginResponse {
    /// Login succeeded when a token was issued or `success` is true.
    pub fn is_success(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty()) || self.success == Some(true)
    }
}

// ── Vouchers ─────────────────────────────────────────────────────────

/// The used indicator in whatever form the backend chose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsedFlag {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl UsedFlag {
    fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Number(n) => Some(*n != 0),
            Self::Text(s) => status_is_used(s),
        }
    }
}

fn status_is_used(status: &str) -> Option<bool> {
    match status.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "used" | "sold" | "redeemed" => Some(true),
        "false" | "0" | "no" | "unused" | "available" | "new" => Some(false),
        _ => None,
    }
}

/// A voucher record as returned by `GET vouchers`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVoucher {
    #[serde(default, deserialize_with = "lenient_id", alias = "_id")]
    pub id: Option<RawId>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub serial: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pin: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", rename = "type", alias = "category")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_used")]
    pub used: Option<UsedFlag>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reference: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        alias = "dateUsed",
        alias = "used_at",
        alias = "usedAt"
    )]
    pub date_used: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
}

impl RawVoucher {
    /// Normalized used indicator: `used` wins over `status`; unknown means unused.
    pub fn is_used(&self) -> bool {
        self.used
            .as_ref()
            .and_then(UsedFlag::as_bool)
            .or_else(|| self.status.as_deref().and_then(status_is_used))
            .unwrap_or(false)
    }
}

/// Every accepted shape of the voucher list response.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum VoucherListResponse {
    Wrapped {
        #[serde(deserialize_with = "nullable_list")]
        vouchers: Vec<RawVoucher>,
    },
    Data {
        #[serde(deserialize_with = "nullable_list")]
        data: Vec<RawVoucher>,
    },
    Bare(Vec<RawVoucher>),
    /// An object without a recognised list key.
    Empty {},
}

impl VoucherListResponse {
    pub fn into_vouchers(self) -> Vec<RawVoucher> {
        match self {
            Self::Wrapped { vouchers } => vouchers,
            Self::Data { data } => data,
            Self::Bare(list) => list,
            Self::Empty {} => Vec::new(),
        }
    }
}

/// Query parameters for `GET vouchers` in query listing mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoucherQuery<'a> {
    /// `used` / `unused`; `None` means all.
    pub status: Option<&'a str>,
    pub search: Option<&'a str>,
}

impl<'a> VoucherQuery<'a> {
    pub(crate) fn pairs(&self) -> Vec<(&'static str, &'a str)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status.filter(|s| !s.is_empty() && *s != "all") {
            pairs.push(("status", status));
        }
        if let Some(search) = self.search.map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("search", search));
        }
        pairs
    }
}

/// Body for `POST vouchers` (manual add).
#[derive(Debug, Clone, Serialize)]
pub struct NewVoucher {
    pub serial: String,
    pub pin: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// One row of a bulk upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadRow {
    pub serial: String,
    pub pin: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct UploadRequest<'a> {
    pub vouchers: &'a [UploadRow],
}

/// How a voucher is identified when marking it used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherRef {
    Id(RawId),
    Serial(String),
}

/// Body for `POST mark-used`.
#[derive(Debug, Clone, Serialize)]
pub struct MarkUsedRequest {
    #[serde(flatten)]
    pub target: VoucherRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct IdRequest<'a> {
    pub id: &'a RawId,
}

// ── Reports ──────────────────────────────────────────────────────────

/// `{total, unused, used}` counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct StatsCounts {
    #[serde(default, deserialize_with = "lenient_count")]
    pub total: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub unused: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub used: u64,
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StatsResponse {
    Wrapped { stats: StatsCounts },
    Flat(StatsCounts),
}

impl StatsResponse {
    pub fn into_counts(self) -> StatsCounts {
        match self {
            Self::Wrapped { stats } | Self::Flat(stats) => stats,
        }
    }
}

/// A purchase record from `GET sales`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSale {
    #[serde(default, deserialize_with = "lenient_id", alias = "_id")]
    pub id: Option<RawId>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub voucher_serial: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub voucher_pin: Option<String>,
    /// Combined `"serial | pin"` form used by older backends.
    #[serde(default, deserialize_with = "lenient_string")]
    pub voucher: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reference: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", alias = "createdAt")]
    pub created_at: Option<String>,
}

impl RawSale {
    /// The first available timestamp among `date`, `time`, `created_at`.
    pub fn timestamp(&self) -> Option<&str> {
        [&self.date, &self.time, &self.created_at]
            .into_iter()
            .find_map(|v| v.as_deref().filter(|s| !s.is_empty()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SalesResponse {
    Sales {
        #[serde(deserialize_with = "nullable_list")]
        sales: Vec<RawSale>,
    },
    Purchases {
        #[serde(deserialize_with = "nullable_list")]
        purchases: Vec<RawSale>,
    },
    Data {
        #[serde(deserialize_with = "nullable_list")]
        data: Vec<RawSale>,
    },
    Bare(Vec<RawSale>),
    Empty {},
}

impl SalesResponse {
    pub fn into_sales(self) -> Vec<RawSale> {
        match self {
            Self::Sales { sales } => sales,
            Self::Purchases { purchases } => purchases,
            Self::Data { data } => data,
            Self::Bare(list) => list,
            Self::Empty {} => Vec::new(),
        }
    }
}

// ── Lenient field decoding ───────────────────────────────────────────

/// Strings, numbers and booleans all read as text; anything else is absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<RawId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => Some(
            n.as_i64()
                .map_or_else(|| RawId::Text(n.to_string()), RawId::Number),
        ),
        Value::String(s) => Some(RawId::Text(s)),
        _ => None,
    })
}

fn lenient_used<'de, D>(deserializer: D) -> Result<Option<UsedFlag>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => Some(UsedFlag::Bool(b)),
        Value::Number(n) => Some(UsedFlag::Number(
            n.as_i64()
                .unwrap_or_else(|| i64::from(n.as_f64().is_some_and(|f| f.abs() > 0.0))),
        )),
        Value::String(s) => Some(UsedFlag::Text(s)),
        _ => None,
    })
}

/// `null` reads as an empty list.
fn nullable_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    fn vouchers(value: Value) -> Vec<RawVoucher> {
        serde_json::from_value::<VoucherListResponse>(value)
            .unwrap()
            .into_vouchers()
    }

    #[test]
    fn list_shapes_normalize_identically() {
        let row = json!({"id": 1, "serial": "S1", "pin": "P1", "used": false});
        for body in [
            json!({"vouchers": [row.clone()]}),
            json!({"data": [row.clone()]}),
            json!([row.clone()]),
        ] {
            let list = vouchers(body);
            assert_eq!(list.len(), 1);
            assert_eq!(list[0].serial.as_deref(), Some("S1"));
            assert_eq!(list[0].id, Some(RawId::Number(1)));
        }
    }

    #[test]
    fn used_indicator_variants() {
        let list = vouchers(json!([
            {"serial": "a", "used": true},
            {"serial": "b", "used": 0},
            {"serial": "c", "used": "1"},
            {"serial": "d", "status": "used"},
            {"serial": "e", "status": "available"},
            {"serial": "f"},
        ]));
        let flags: Vec<bool> = list.iter().map(RawVoucher::is_used).collect();
        assert_eq!(flags, [true, false, true, true, false, false]);
    }

    #[test]
    fn string_ids_and_category_alias() {
        let list = vouchers(json!({"vouchers": [
            {"_id": "65ab", "serial": "X", "pin": "Y", "category": "bece", "dateUsed": "2024-01-02"}
        ]}));
        assert_eq!(list[0].id, Some(RawId::Text("65ab".into())));
        assert_eq!(list[0].kind.as_deref(), Some("bece"));
        assert_eq!(list[0].date_used.as_deref(), Some("2024-01-02"));
    }

    #[test]
    fn numeric_scalars_read_as_text() {
        let list = vouchers(json!({"vouchers": [
            {"id": 1, "serial": "WAS001", "pin": 1234, "used": false, "phone": 244123456, "reference": null}
        ]}));
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].pin.as_deref(), Some("1234"));
        assert_eq!(list[0].phone.as_deref(), Some("244123456"));
        assert_eq!(list[0].reference, None);
    }

    #[test]
    fn odd_row_values_keep_the_row() {
        let list = vouchers(json!([
            {"id": 7.5, "serial": "A", "used": {"at": "noon"}},
            {"id": null, "serial": "B", "used": 2},
        ]));
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, Some(RawId::Text("7.5".into())));
        assert!(!list[0].is_used());
        assert_eq!(list[1].id, None);
        assert!(list[1].is_used());
    }

    #[test]
    fn null_or_missing_list_is_empty() {
        assert!(vouchers(json!({"vouchers": null})).is_empty());
        assert!(vouchers(json!({"data": null})).is_empty());
        assert!(vouchers(json!({"success": true})).is_empty());

        let sales = serde_json::from_value::<SalesResponse>(json!({"sales": null}))
            .unwrap()
            .into_sales();
        assert!(sales.is_empty());
    }

    #[test]
    fn sales_accept_numeric_contact_fields() {
        let list = serde_json::from_value::<SalesResponse>(json!({"sales": [
            {"id": 2, "name": "Ama", "phone": 244123456, "voucher_serial": 1001, "voucher_pin": 98765}
        ]}))
        .unwrap()
        .into_sales();
        assert_eq!(list[0].phone.as_deref(), Some("244123456"));
        assert_eq!(list[0].voucher_serial.as_deref(), Some("1001"));
        assert_eq!(list[0].voucher_pin.as_deref(), Some("98765"));
    }

    #[test]
    fn ack_semantics() {
        let ok: Ack = serde_json::from_value(json!({"message": "done"})).unwrap();
        assert!(ok.is_success());
        let refused: Ack = serde_json::from_value(json!({"success": false, "message": "nope"})).unwrap();
        assert!(!refused.is_success());
        assert_eq!(refused.text(), Some("nope"));
        let errored: Ack = serde_json::from_value(json!({"error": "duplicate serial"})).unwrap();
        assert!(!errored.is_success());
        assert_eq!(errored.text(), Some("duplicate serial"));
    }

    #[test]
    fn login_success_rules() {
        let with_token: LoginResponse = serde_json::from_value(json!({"token": "abc"})).unwrap();
        assert!(with_token.is_success());
        let flag_only: LoginResponse = serde_json::from_value(json!({"success": true})).unwrap();
        assert!(flag_only.is_success());
        let empty_token: LoginResponse =
            serde_json::from_value(json!({"success": false, "token": ""})).unwrap();
        assert!(!empty_token.is_success());
    }

    #[test]
    fn stats_accept_strings_and_wrapping() {
        let flat: StatsResponse =
            serde_json::from_value(json!({"total": "10", "unused": 7, "used": 3})).unwrap();
        assert_eq!(
            flat.into_counts(),
            StatsCounts { total: 10, unused: 7, used: 3 }
        );
        let wrapped: StatsResponse =
            serde_json::from_value(json!({"stats": {"total": 2, "used": 2}})).unwrap();
        assert_eq!(wrapped.into_counts().unused, 0);
    }

    #[test]
    fn sales_timestamp_fallback() {
        let list = serde_json::from_value::<SalesResponse>(json!({"purchases": [
            {"id": 4, "voucher": "S | P", "time": "09:15"},
        ]}))
        .unwrap()
        .into_sales();
        assert_eq!(list[0].timestamp(), Some("09:15"));
    }

    #[test]
    fn voucher_query_skips_empty_parts() {
        let q = VoucherQuery { status: Some("all"), search: Some("  ") };
        assert!(q.pairs().is_empty());
        let q = VoucherQuery { status: Some("used"), search: Some(" 0244 ") };
        assert_eq!(q.pairs(), vec![("status", "used"), ("search", "0244")]);
    }

    #[test]
    fn mark_used_body_shapes() {
        let by_id = MarkUsedRequest { target: VoucherRef::Id(RawId::Number(9)), buyer: None };
        assert_eq!(serde_json::to_value(&by_id).unwrap(), json!({"id": 9}));
        let by_serial = MarkUsedRequest {
            target: VoucherRef::Serial("SN-1".into()),
            buyer: Some("0244000000".into()),
        };
        assert_eq!(
            serde_json::to_value(&by_serial).unwrap(),
            json!({"serial": "SN-1", "buyer": "0244000000"})
        );
    }
}
