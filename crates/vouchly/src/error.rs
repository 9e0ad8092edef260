//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use vouchly_config::ConfigError;
use vouchly_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the backend at {url}")]
    #[diagnostic(
        code(vouchly::connection_failed),
        help(
            "Check that the site is up and the URL in your profile is right.\n\
             Reason: {reason}\n\
             Self-signed certificate? Try --insecure (-k)."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(vouchly::timeout),
        help("Increase the timeout with --timeout or check the backend's health.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Login failed: {message}")]
    #[diagnostic(
        code(vouchly::auth_failed),
        help(
            "Check the admin password for profile '{profile}'.\n\
             Store it with: vouchly config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("Not logged in")]
    #[diagnostic(
        code(vouchly::not_logged_in),
        help("Run: vouchly login --profile {profile}")
    )]
    NotLoggedIn { profile: String },

    #[error("Session expired")]
    #[diagnostic(
        code(vouchly::session_expired),
        help(
            "The backend rejected the stored token; it has been cleared.\n\
             Run: vouchly login --profile {profile}"
        )
    )]
    SessionExpired { profile: String },

    #[error("No password available for profile '{profile}'")]
    #[diagnostic(
        code(vouchly::no_credentials),
        help(
            "Set VOUCHLY_PASSWORD, run `vouchly config set-password`,\n\
             or run `vouchly login` from an interactive terminal."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Voucher '{identifier}' not found")]
    #[diagnostic(
        code(vouchly::not_found),
        help("Run: vouchly vouchers list --search {identifier}")
    )]
    NotFound { identifier: String },

    #[error("{action} is already in progress")]
    #[diagnostic(code(vouchly::conflict))]
    InFlight { action: String },

    // ── Backend ──────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(vouchly::rejected))]
    Rejected { message: String },

    #[error("Backend error (HTTP {status}): {message}")]
    #[diagnostic(code(vouchly::api_error))]
    ApiError { status: u16, message: String },

    #[error("Unexpected response from server")]
    #[diagnostic(
        code(vouchly::unexpected_response),
        help("Run with -vv to see the raw response. Detail: {detail}")
    )]
    UnexpectedResponse { detail: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(vouchly::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(vouchly::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: vouchly config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(vouchly::no_config),
        help(
            "Create one with: vouchly config init\n\
             Or pass --backend <URL>. Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Profile '{profile}' has no payment settings")]
    #[diagnostic(
        code(vouchly::no_payment),
        help("Set one with: vouchly config set payment.public_key <KEY>")
    )]
    NoPayment { profile: String },

    #[error(transparent)]
    #[diagnostic(code(vouchly::config))]
    Config(Box<ConfigError>),

    #[error("Session storage failed: {message}")]
    #[diagnostic(
        code(vouchly::storage),
        help("Set `token_store = \"file\"` on the profile if no keyring is available.")
    )]
    Storage { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(vouchly::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. }
            | Self::NotLoggedIn { .. }
            | Self::SessionExpired { .. }
            | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::InFlight { .. } => exit_code::CONFLICT,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Fill in the active profile and configured timeout, which the core
    /// error does not carry.
    pub fn with_context(self, name: &str, timeout_secs: u64) -> Self {
        match self {
            Self::Timeout { .. } => Self::Timeout {
                seconds: timeout_secs,
            },
            Self::AuthFailed { message, .. } => Self::AuthFailed {
                profile: name.into(),
                message,
            },
            Self::NotLoggedIn { .. } => Self::NotLoggedIn {
                profile: name.into(),
            },
            Self::SessionExpired { .. } => Self::SessionExpired {
                profile: name.into(),
            },
            other => other,
        }
    }
}

// ── ConfigError → CliError ──────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoPayment { profile } => Self::NoPayment { profile },
            ConfigError::UnknownProfile { profile } => Self::ProfileNotFound {
                name: profile,
                available: String::new(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(Box::new(other)),
        }
    }
}

// ── CoreError → CliError ────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },

            CoreError::Timeout => Self::Timeout { seconds: 0 },

            CoreError::AuthenticationFailed { message } => Self::AuthFailed {
                profile: "default".into(),
                message,
            },

            CoreError::SessionExpired => Self::SessionExpired {
                profile: "default".into(),
            },

            CoreError::NotLoggedIn => Self::NotLoggedIn {
                profile: "default".into(),
            },

            CoreError::VoucherNotFound { identifier } => Self::NotFound { identifier },

            err @ (CoreError::MalformedVoucher { .. } | CoreError::UnexpectedResponse { .. }) => {
                Self::UnexpectedResponse {
                    detail: err.to_string(),
                }
            }

            err @ CoreError::Rejected { .. } => Self::Rejected {
                message: err.user_message(),
            },

            CoreError::ValidationFailed { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::AlreadyInFlight { action } => Self::InFlight { action },

            CoreError::Api { message, status } => Self::ApiError { status, message },

            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Storage { message } => Self::Storage { message },

            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}
