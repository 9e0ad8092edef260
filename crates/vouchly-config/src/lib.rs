//! Shared configuration for the vouchly CLI and TUI.
//!
//! TOML profiles, password resolution (env + keyring + plaintext), session
//! token storage, and translation to `vouchly_core` runtime configs. Both
//! binaries depend on this crate; the CLI layers its global flags on top.

mod tokens;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use vouchly_core::{
    ApiLayout, ConsoleConfig, DEFAULT_VOUCHER_TYPE, EmailPolicy, ListingMode, MemoryTokenStore,
    PaymentConfig, StoredSession, TlsVerification, TokenStore, UploadEncoding,
};

pub use tokens::{FileTokenStore, KeyringTokenStore};

/// Keyring service name.
pub const KEYRING_SERVICE: &str = "vouchly";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' not found")]
    UnknownProfile { profile: String },

    #[error("profile '{profile}' has no [payment] section")]
    NoPayment { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: explicit choice, then the default.
    pub fn profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named backend profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Site root of the voucher backend (e.g. "https://vouchers.example.com").
    pub backend: String,

    /// Admin route layout: "prefixed" (`/admin/x`) or "namespaced" (`/admin/api/x`).
    #[serde(default = "default_layout")]
    pub api_layout: String,

    /// Voucher listing: "query" (server-side filter params) or "plain".
    #[serde(default = "default_listing")]
    pub listing: String,

    /// Bulk upload body: "json" or "multipart".
    #[serde(default = "default_upload")]
    pub upload: String,

    /// Admin username, for backends that ask for one.
    pub username: Option<String>,

    /// Admin password (plaintext -- prefer keyring or `VOUCHLY_PASSWORD`).
    pub password: Option<String>,

    /// Where the session token lives: "keyring", "file" or "memory".
    #[serde(default = "default_token_store")]
    pub token_store: String,

    /// Category applied to imported rows without a type.
    pub default_type: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept invalid TLS certificates.
    pub insecure: Option<bool>,

    /// Request timeout in seconds.
    pub timeout: Option<u64>,

    /// TUI background refresh in seconds (0 disables).
    pub refresh_interval: Option<u64>,

    /// Buyer checkout settings.
    pub payment: Option<PaymentProfile>,
}

impl Profile {
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            api_layout: default_layout(),
            listing: default_listing(),
            upload: default_upload(),
            username: None,
            password: None,
            token_store: default_token_store(),
            default_type: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            refresh_interval: None,
            payment: None,
        }
    }
}

fn default_layout() -> String {
    "prefixed".into()
}
fn default_listing() -> String {
    "query".into()
}
fn default_upload() -> String {
    "json".into()
}
fn default_token_store() -> String {
    "keyring".into()
}

/// `[profiles.<name>.payment]`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PaymentProfile {
    /// Site serving `/verify-payment` and the success page; defaults to `backend`.
    pub site: Option<String>,
    /// Public key of the hosted payment provider.
    pub public_key: String,
    /// Price in minor units.
    pub amount_minor: Option<u64>,
    pub currency: Option<String>,
    pub success_page: Option<String>,
    /// "required" or "generated".
    pub email: Option<String>,
    /// Domain for generated buyer emails.
    pub email_domain: Option<String>,
    pub voucher_type: Option<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `VOUCHLY_CONFIG`, then platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("VOUCHLY_CONFIG") {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "vouchly", "vouchly").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory for session files when the file token store is used.
pub fn data_dir() -> PathBuf {
    ProjectDirs::from("com", "vouchly", "vouchly").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("data");
            p
        },
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("vouchly");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment (`VOUCHLY_DEFAULTS__TIMEOUT=60`).
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path();

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("VOUCHLY_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file is missing or unreadable.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the admin password: `VOUCHLY_PASSWORD`, keyring, plaintext.
///
/// `None` means the caller should prompt.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    if let Ok(pw) = std::env::var("VOUCHLY_PASSWORD") {
        return Some(SecretString::from(pw));
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Some(SecretString::from(pw));
        }
    }

    profile
        .password
        .as_ref()
        .map(|pw| SecretString::from(pw.clone()))
}

/// Store the admin password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
        .and_then(|entry| entry.set_password(password))
        .map_err(|e| ConfigError::Validation {
            field: "password".into(),
            reason: format!("keyring: {e}"),
        })
}

/// The token store configured for a profile.
///
/// `VOUCHLY_TOKEN` overrides everything with an in-memory session, for
/// scripts and CI.
pub fn token_store(profile: &Profile, profile_name: &str) -> Result<Arc<dyn TokenStore>, ConfigError> {
    if let Ok(token) = std::env::var("VOUCHLY_TOKEN") {
        return Ok(Arc::new(MemoryTokenStore::with_session(StoredSession {
            token: Some(SecretString::from(token)),
            remember: false,
        })));
    }

    match profile.token_store.as_str() {
        "keyring" => Ok(Arc::new(KeyringTokenStore::new(profile_name))),
        "file" => Ok(Arc::new(FileTokenStore::for_profile(&data_dir(), profile_name))),
        "memory" => Ok(Arc::new(MemoryTokenStore::new())),
        other => Err(ConfigError::Validation {
            field: "token_store".into(),
            reason: format!("expected 'keyring', 'file' or 'memory', got '{other}'"),
        }),
    }
}

// ── Translation to runtime configs ──────────────────────────────────

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}

fn parse_choice<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Validation {
        field: field.into(),
        reason: e.to_string(),
    })
}

fn tls_for(profile: &Profile) -> TlsVerification {
    if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Build a `ConsoleConfig` from a profile, with no CLI overrides.
pub fn profile_to_console_config(profile: &Profile) -> Result<ConsoleConfig, ConfigError> {
    let mut config = ConsoleConfig::new(parse_url("backend", &profile.backend)?);
    config.layout = parse_choice::<ApiLayout>("api_layout", &profile.api_layout)?;
    config.listing = parse_choice::<ListingMode>("listing", &profile.listing)?;
    config.upload = parse_choice::<UploadEncoding>("upload", &profile.upload)?;
    config.tls = tls_for(profile);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or_else(default_timeout));
    config.refresh_interval_secs = profile.refresh_interval.unwrap_or(30);
    config.default_voucher_type = profile
        .default_type
        .clone()
        .unwrap_or_else(|| DEFAULT_VOUCHER_TYPE.into())
        .to_uppercase();
    Ok(config)
}

/// Build a `PaymentConfig` from a profile's `[payment]` section.
pub fn profile_to_payment_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<PaymentConfig, ConfigError> {
    let payment = profile.payment.as_ref().ok_or_else(|| ConfigError::NoPayment {
        profile: profile_name.into(),
    })?;

    let site = payment.site.as_deref().unwrap_or(&profile.backend);
    let mut config = PaymentConfig::new(parse_url("payment.site", site)?, payment.public_key.clone());

    if let Some(amount) = payment.amount_minor {
        config.amount_minor = amount;
    }
    if let Some(ref currency) = payment.currency {
        config.currency.clone_from(currency);
    }
    if let Some(ref page) = payment.success_page {
        config.success_page.clone_from(page);
    }
    config.email_policy = match payment.email.as_deref().unwrap_or("required") {
        "required" => EmailPolicy::Required,
        "generated" => EmailPolicy::Generated {
            domain: payment
                .email_domain
                .clone()
                .ok_or_else(|| ConfigError::Validation {
                    field: "payment.email_domain".into(),
                    reason: "required when payment.email = \"generated\"".into(),
                })?,
        },
        other => {
            return Err(ConfigError::Validation {
                field: "payment.email".into(),
                reason: format!("expected 'required' or 'generated', got '{other}'"),
            });
        }
    };
    config.voucher_type.clone_from(&payment.voucher_type);
    config.tls = tls_for(profile);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or_else(default_timeout));
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn minimal_profile_uses_defaults() {
        let profile: Profile = toml::from_str(r#"backend = "https://v.example.com""#).unwrap();
        let config = profile_to_console_config(&profile).unwrap();

        assert_eq!(config.layout, ApiLayout::Prefixed);
        assert_eq!(config.listing, ListingMode::Query);
        assert_eq!(config.upload, UploadEncoding::Json);
        assert_eq!(config.tls, TlsVerification::SystemDefaults);
        assert_eq!(config.default_voucher_type, "WASSCE");
        assert_eq!(profile.token_store, "keyring");
    }

    #[test]
    fn layout_and_modes_parse() {
        let mut profile = Profile::new("http://localhost:3000");
        profile.api_layout = "namespaced".into();
        profile.listing = "plain".into();
        profile.upload = "multipart".into();
        profile.insecure = Some(true);
        profile.default_type = Some("bece".into());

        let config = profile_to_console_config(&profile).unwrap();

        assert_eq!(config.layout, ApiLayout::Namespaced);
        assert_eq!(config.listing, ListingMode::Plain);
        assert_eq!(config.upload, UploadEncoding::Multipart);
        assert_eq!(config.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(config.default_voucher_type, "BECE");
    }

    #[test]
    fn bad_values_are_validation_errors() {
        let mut profile = Profile::new("not a url");
        assert!(matches!(
            profile_to_console_config(&profile),
            Err(ConfigError::Validation { ref field, .. }) if field == "backend"
        ));

        profile.backend = "https://ok.example.com".into();
        profile.api_layout = "graphql".into();
        assert!(matches!(
            profile_to_console_config(&profile),
            Err(ConfigError::Validation { ref field, .. }) if field == "api_layout"
        ));
    }

    #[test]
    fn payment_section_translates() {
        let toml_src = r#"
            backend = "https://shop.example.com"

            [payment]
            public_key = "pk_live_x"
            amount_minor = 2000
            email = "generated"
            email_domain = "buyers.example.com"
        "#;
        let profile: Profile = toml::from_str(toml_src).unwrap();
        let config = profile_to_payment_config(&profile, "default").unwrap();

        assert_eq!(config.site_url.as_str(), "https://shop.example.com/");
        assert_eq!(config.amount_minor, 2000);
        assert_eq!(config.currency, "GHS");
        assert_eq!(
            config.email_policy,
            EmailPolicy::Generated {
                domain: "buyers.example.com".into()
            }
        );
    }

    #[test]
    fn generated_email_needs_domain() {
        let mut profile = Profile::new("https://shop.example.com");
        profile.payment = Some(PaymentProfile {
            public_key: "pk".into(),
            email: Some("generated".into()),
            ..PaymentProfile::default()
        });
        assert!(profile_to_payment_config(&profile, "default").is_err());

        profile.payment = None;
        assert!(matches!(
            profile_to_payment_config(&profile, "shop"),
            Err(ConfigError::NoPayment { .. })
        ));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let mut cfg = Config::default();
        cfg.profiles
            .insert("default".into(), Profile::new("https://v.example.com"));

        let text = toml::to_string_pretty(&cfg).unwrap();
        let back: Config = toml::from_str(&text).unwrap();

        assert_eq!(back.profile_name(None), "default");
        assert_eq!(back.profile("default").unwrap().backend, "https://v.example.com");
        assert!(back.profile("missing").is_err());
    }
}
