// ── Runtime configuration ──
//
// These types describe how to reach the voucher backend and how to run a
// checkout. They never touch disk: the CLI/TUI builds them from a profile
// and hands them in.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

pub use vouchly_api::{ApiLayout, ListingMode, UploadEncoding};

/// Default voucher category applied on import when a row has none.
pub const DEFAULT_VOUCHER_TYPE: &str = "WASSCE";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (local development backends).
    DangerAcceptInvalid,
}

/// Configuration for the admin console.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Site root, e.g. `https://vouchers.example.com`.
    pub url: Url,
    pub layout: ApiLayout,
    pub listing: ListingMode,
    pub upload: UploadEncoding,
    pub tls: TlsVerification,
    pub timeout: Duration,
    /// Seconds between background refreshes in the TUI. 0 = never.
    pub refresh_interval_secs: u64,
    /// Category for imported rows that carry none.
    pub default_voucher_type: String,
}

impl ConsoleConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            layout: ApiLayout::default(),
            listing: ListingMode::default(),
            upload: UploadEncoding::default(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            refresh_interval_secs: 0,
            default_voucher_type: DEFAULT_VOUCHER_TYPE.into(),
        }
    }
}

/// How the buyer's email is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailPolicy {
    /// The buyer must supply an email.
    Required,
    /// Email is optional; when absent one is derived as `{phone}@{domain}`.
    Generated { domain: String },
}

/// Configuration for the buyer checkout flow.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Site root hosting `/verify-payment` and the confirmation page.
    pub site_url: Url,
    /// Public key of the hosted payment provider.
    pub public_key: String,
    /// Price in minor units (pesewas for GHS).
    pub amount_minor: u64,
    pub currency: String,
    /// Path of the confirmation page, relative to `site_url`.
    pub success_page: String,
    pub email_policy: EmailPolicy,
    /// Voucher category requested from the backend, if the site sells several.
    pub voucher_type: Option<String>,
    pub tls: TlsVerification,
    pub timeout: Duration,
}

impl PaymentConfig {
    pub fn new(site_url: Url, public_key: impl Into<String>) -> Self {
        Self {
            site_url,
            public_key: public_key.into(),
            amount_minor: 2500 * 100,
            currency: "GHS".into(),
            success_page: "/success.html".into(),
            email_policy: EmailPolicy::Required,
            voucher_type: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

pub(crate) fn transport_for(
    tls: &TlsVerification,
    timeout: Duration,
) -> vouchly_api::TransportConfig {
    let tls = match tls {
        TlsVerification::SystemDefaults => vouchly_api::TlsMode::System,
        TlsVerification::CustomCa(path) => vouchly_api::TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => vouchly_api::TlsMode::DangerAcceptInvalid,
    };
    vouchly_api::TransportConfig { tls, timeout }
}
