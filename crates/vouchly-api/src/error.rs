use thiserror::Error;

/// Top-level error type for the `vouchly-api` crate.
///
/// Covers every failure mode of the admin and payment surfaces.
/// `vouchly-core` maps these into user-facing messages.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login was refused (wrong password, disabled account, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The backend answered HTTP 401 to an authenticated call.
    #[error("Session rejected by backend (HTTP 401)")]
    Unauthorized,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Backend ─────────────────────────────────────────────────────
    /// Non-success HTTP status other than 401.
    #[error("Backend returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// HTTP succeeded but the body carried `success: false` or an `error` field.
    #[error("{}", message.as_deref().unwrap_or("request rejected by backend"))]
    Rejected { message: Option<String> },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the backend no longer accepts the session token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Returns `true` for connection-level failures (refused, DNS, timeout).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Returns `true` if the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// The message supplied by the backend, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Authentication { message } | Self::Http { message, .. } => Some(message),
            Self::Rejected { message } => message.as_deref(),
            _ => None,
        }
    }
}
