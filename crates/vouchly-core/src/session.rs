// ── Session persistence ──
//
// The bearer token survives restarts through a `TokenStore`. Front ends
// pick the backing (OS keyring, file, memory); the console only talks to
// the trait.

use std::sync::{Mutex, PoisonError};

use secrecy::SecretString;

use crate::error::CoreError;

/// Key under which the token is persisted.
pub const TOKEN_KEY: &str = "admin_token";
/// Key under which the remember flag is persisted.
pub const REMEMBER_KEY: &str = "admin_remember";

/// A persisted login.
#[derive(Debug, Clone)]
pub struct StoredSession {
    /// `None` when the backend accepted the login without issuing a token.
    pub token: Option<SecretString>,
    pub remember: bool,
}

/// Persistent key-value storage for the session.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<StoredSession>, CoreError>;
    fn save(&self, session: &StoredSession) -> Result<(), CoreError>;
    fn clear(&self) -> Result<(), CoreError>;
}

/// Process-local store; nothing outlives the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<StoredSession>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded store, e.g. from an environment variable.
    pub fn with_session(session: StoredSession) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<StoredSession>, CoreError> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, session: &StoredSession) -> Result<(), CoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Observable login state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn { remember: bool },
    /// The backend rejected the token; the user must log in again.
    Expired,
}

impl SessionState {
    pub fn is_logged_in(self) -> bool {
        matches!(self, Self::LoggedIn { .. })
    }
}
