// ── Persistent session stores ──
//
// Keyring entries are `{profile}/admin_token` and `{profile}/admin_remember`
// under the `vouchly` service. The file store keeps the same two keys in a
// per-profile TOML file for hosts without a secret service.

use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use vouchly_core::session::{REMEMBER_KEY, TOKEN_KEY};
use vouchly_core::{CoreError, StoredSession, TokenStore};

use crate::KEYRING_SERVICE;

fn storage_err(context: &str, err: impl std::fmt::Display) -> CoreError {
    CoreError::Storage {
        message: format!("{context}: {err}"),
    }
}

// ── Keyring ─────────────────────────────────────────────────────────

/// Session store backed by the OS keyring.
#[derive(Debug, Clone)]
pub struct KeyringTokenStore {
    profile: String,
}

impl KeyringTokenStore {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry, CoreError> {
        keyring::Entry::new(KEYRING_SERVICE, &format!("{}/{key}", self.profile))
            .map_err(|e| storage_err("keyring", e))
    }

    fn read(&self, key: &str) -> Result<Option<String>, CoreError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(storage_err("keyring read", e)),
        }
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(storage_err("keyring delete", e)),
        }
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<StoredSession>, CoreError> {
        let Some(remember) = self.read(REMEMBER_KEY)? else {
            return Ok(None);
        };
        let token = self.read(TOKEN_KEY)?.map(SecretString::from);
        Ok(Some(StoredSession {
            token,
            remember: remember == "true",
        }))
    }

    fn save(&self, session: &StoredSession) -> Result<(), CoreError> {
        debug!(profile = %self.profile, "saving session to keyring");
        match session.token {
            Some(ref token) => self
                .entry(TOKEN_KEY)?
                .set_password(token.expose_secret())
                .map_err(|e| storage_err("keyring write", e))?,
            None => self.remove(TOKEN_KEY)?,
        }
        self.entry(REMEMBER_KEY)?
            .set_password(if session.remember { "true" } else { "false" })
            .map_err(|e| storage_err("keyring write", e))
    }

    fn clear(&self) -> Result<(), CoreError> {
        self.remove(TOKEN_KEY)?;
        self.remove(REMEMBER_KEY)
    }
}

// ── File ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, Serialize)]
struct SessionFile {
    admin_token: Option<String>,
    #[serde(default)]
    admin_remember: bool,
}

/// Session store backed by a TOML file (mode 0600 on unix).
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `{dir}/sessions/{profile}.toml`
    pub fn for_profile(dir: &Path, profile: &str) -> Self {
        Self::new(dir.join("sessions").join(format!("{profile}.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<StoredSession>, CoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_err("read session file", e)),
        };
        let file: SessionFile =
            toml::from_str(&text).map_err(|e| storage_err("parse session file", e))?;
        Ok(Some(StoredSession {
            token: file.admin_token.map(SecretString::from),
            remember: file.admin_remember,
        }))
    }

    fn save(&self, session: &StoredSession) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| storage_err("create session dir", e))?;
        }
        let file = SessionFile {
            admin_token: session
                .token
                .as_ref()
                .map(|t| t.expose_secret().to_owned()),
            admin_remember: session.remember,
        };
        let text = toml::to_string(&file).map_err(|e| storage_err("encode session", e))?;
        std::fs::write(&self.path, text).map_err(|e| storage_err("write session file", e))?;
        restrict_permissions(&self.path)?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_err("remove session file", e)),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), CoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| storage_err("chmod session file", e))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), CoreError> {
    Ok(())
}
