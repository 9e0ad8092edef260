// Admin authentication
//
// Password login exchanging credentials for a bearer token. There is no
// server-side logout; dropping the token ends the session.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::admin::client::{AdminClient, decode};
use crate::admin::models::{LoginRequest, LoginResponse};
use crate::error::Error;

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginGrant {
    /// Issued token; `None` when the backend reports success without one.
    pub token: Option<SecretString>,
    pub message: Option<String>,
}

impl AdminClient {
    /// `POST {prefix}/login`
    ///
    /// On success the issued token (if any) is installed on this client.
    /// Any non-success answer, including HTTP 401, is reported as
    /// [`Error::Authentication`] carrying the server's message.
    pub async fn login(
        &self,
        username: Option<&str>,
        password: &SecretString,
    ) -> Result<LoginGrant, Error> {
        let url = self.admin_url("login")?;
        debug!("logging in at {}", url);

        let body = LoginRequest {
            username: username.filter(|u| !u.is_empty()),
            password: password.expose_secret(),
        };

        let resp = self.http_post_unauthenticated(url, &body).await?;
        let status = resp.status();
        let text = resp.text().await?;

        let parsed = if text.trim().is_empty() {
            LoginResponse::default()
        } else {
            decode::<LoginResponse>(&text).unwrap_or_default()
        };

        if !status.is_success() || !parsed.is_success() {
            let message = parsed
                .message
                .or(parsed.error)
                .unwrap_or_else(|| format!("login failed (HTTP {})", status.as_u16()));
            return Err(Error::Authentication { message });
        }

        let token = parsed
            .token
            .filter(|t| !t.is_empty())
            .map(SecretString::from);

        match &token {
            Some(token) => self.set_token(token.clone()),
            None => self.clear_token(),
        }

        debug!(with_token = token.is_some(), "login successful");
        Ok(LoginGrant {
            token,
            message: parsed.message,
        })
    }

    /// End the session locally.
    pub fn logout(&self) {
        debug!("dropping admin session");
        self.clear_token();
    }
}
