// ── Core error types ──
//
// User-facing errors from vouchly-core. Consumers never see HTTP status
// codes or JSON parse failures directly; `From<vouchly_api::Error>`
// translates transport-layer errors into domain variants, and
// `user_message()` gives the text a UI should show.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    // ── Session errors ───────────────────────────────────────────────
    #[error("Login failed: {message}")]
    AuthenticationFailed { message: String },

    /// The backend rejected the session; the token has been cleared.
    #[error("Session expired -- please log in again")]
    SessionExpired,

    #[error("Not logged in")]
    NotLoggedIn,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Voucher not found: {identifier}")]
    VoucherNotFound { identifier: String },

    #[error("Malformed voucher in response: {raw:?}")]
    MalformedVoucher { raw: String },

    #[error("Unexpected response from backend: {message}")]
    UnexpectedResponse { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("{}", message.as_deref().unwrap_or("Request failed"))]
    Rejected { message: Option<String> },

    #[error("{message}")]
    ValidationFailed { message: String },

    #[error("{action} is already in progress")]
    AlreadyInFlight { action: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("Backend error (HTTP {status}): {message}")]
    Api { message: String, status: u16 },

    // ── Local errors ─────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Token storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Text suitable for a toast or a one-line CLI error.
    ///
    /// Transport and parse failures collapse into generic wording; server
    /// rejections show the server's own message.
    pub fn user_message(&self) -> String {
        match self {
            Self::ConnectionFailed { .. } => "Network error, please try again".into(),
            Self::Timeout => "The server took too long to respond".into(),
            Self::UnexpectedResponse { .. } | Self::MalformedVoucher { .. } => {
                "Unexpected response from server".into()
            }
            Self::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            Self::Api { status, .. } => format!("Request failed (HTTP {status})"),
            _ => self.to_string(),
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::NotLoggedIn)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<vouchly_api::Error> for CoreError {
    fn from(err: vouchly_api::Error) -> Self {
        match err {
            vouchly_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            vouchly_api::Error::Unauthorized => CoreError::SessionExpired,
            vouchly_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else {
                    CoreError::ConnectionFailed {
                        url: e.url().map(ToString::to_string).unwrap_or_default(),
                        reason: e.to_string(),
                    }
                }
            }
            vouchly_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            vouchly_api::Error::Tls(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {reason}"),
            },
            vouchly_api::Error::Http { status, message } => CoreError::Api { message, status },
            vouchly_api::Error::Rejected { message } => CoreError::Rejected { message },
            vouchly_api::Error::Deserialization { message, body: _ } => {
                CoreError::UnexpectedResponse { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_shows_server_message_or_fallback() {
        let with = CoreError::from(vouchly_api::Error::Rejected {
            message: Some("Already used".into()),
        });
        assert_eq!(with.user_message(), "Already used");

        let without = CoreError::from(vouchly_api::Error::Rejected { message: None });
        assert_eq!(without.user_message(), "Request failed");
    }

    #[test]
    fn parse_failures_are_generic() {
        let err = CoreError::from(vouchly_api::Error::Deserialization {
            message: "expected value at line 1".into(),
            body: "<html>".into(),
        });
        assert_eq!(err.user_message(), "Unexpected response from server");
    }

    #[test]
    fn unauthorized_becomes_session_expired() {
        let err = CoreError::from(vouchly_api::Error::Unauthorized);
        assert!(err.is_session_expired());
    }
}
