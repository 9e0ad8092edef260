// Admin API HTTP client
//
// Wraps `reqwest::Client` with layout-aware URL construction, bearer-token
// injection, and response classification. Endpoint methods (auth,
// vouchers, reports) live in sibling files as inherent impls so this
// module stays focused on transport mechanics.

use std::sync::{PoisonError, RwLock};

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::admin::models::Ack;
use crate::error::Error;
use crate::layout::ApiLayout;
use crate::transport::TransportConfig;

/// Error bodies come as `{message}` or `{error}`.
#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

const BODY_PREVIEW: usize = 200;

fn preview(body: &str) -> &str {
    let mut end = body.len().min(BODY_PREVIEW);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

/// HTTP client for the voucher backend's admin routes.
///
/// Holds the bearer token issued at login. The token is attached as
/// `Authorization: Bearer <token>` only while one is present; a login that
/// succeeds without issuing a token leaves requests unauthenticated.
pub struct AdminClient {
    http: reqwest::Client,
    base_url: Url,
    layout: ApiLayout,
    token: RwLock<Option<SecretString>>,
}

impl AdminClient {
    /// Create a new admin client from a `TransportConfig`.
    ///
    /// `base_url` is the site root (e.g. `https://vouchers.example.com`);
    /// the layout decides where the admin routes hang off it.
    pub fn new(
        base_url: Url,
        layout: ApiLayout,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, layout))
    }

    /// Create an admin client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, layout: ApiLayout) -> Self {
        Self {
            http,
            base_url,
            layout,
            token: RwLock::new(None),
        }
    }

    // ── Token management ─────────────────────────────────────────────

    /// Install a bearer token (restored from storage or issued at login).
    pub fn set_token(&self, token: SecretString) {
        debug!("installing bearer token");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// Drop the bearer token. Subsequent requests go out unauthenticated.
    pub fn clear_token(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn has_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn apply_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let guard = self.token.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an admin resource: `{base}{prefix}/{resource}`.
    pub(crate) fn admin_url(&self, resource: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let full = format!("{base}{}", self.layout.path(resource));
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<T, Error> {
        debug!("GET {}", url);

        let mut builder = self.http.get(url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        let resp = self.apply_auth(builder).send().await?;
        Self::parse_json(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {}", url);

        let resp = self.apply_auth(self.http.post(url).json(body)).send().await?;
        Self::parse_json(resp).await
    }

    /// POST a JSON body and interpret the response as an acknowledgement.
    pub(crate) async fn post_ack(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<Ack, Error> {
        debug!("POST {}", url);

        let resp = self.apply_auth(self.http.post(url).json(body)).send().await?;
        Self::parse_ack(resp).await
    }

    pub(crate) async fn post_multipart_ack(
        &self,
        url: Url,
        form: reqwest::multipart::Form,
    ) -> Result<Ack, Error> {
        debug!("POST (multipart) {}", url);

        let resp = self.apply_auth(self.http.post(url).multipart(form)).send().await?;
        Self::parse_ack(resp).await
    }

    /// POST without the bearer header, returning the raw response (login).
    pub(crate) async fn http_post_unauthenticated(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<reqwest::Response, Error> {
        Ok(self.http.post(url).json(body).send().await?)
    }

    pub(crate) async fn delete_ack(&self, url: Url) -> Result<Ack, Error> {
        debug!("DELETE {}", url);

        let resp = self.apply_auth(self.http.delete(url)).send().await?;
        Self::parse_ack(resp).await
    }

    // ── Response classification ──────────────────────────────────────

    /// Read the body of a response, mapping 401 and non-2xx statuses to errors.
    async fn checked_body(resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized);
        }

        let body = resp.text().await?;
        trace!(%status, bytes = body.len(), "response received");

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message.or(b.error))
                .unwrap_or_else(|| preview(&body).to_owned());
            return Err(Error::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }

    pub(crate) async fn parse_json<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let body = Self::checked_body(resp).await?;
        decode(&body)
    }

    /// Like [`parse_json`](Self::parse_json) for acknowledgements: an empty
    /// 2xx body is success, `success: false` or `error` is a rejection.
    pub(crate) async fn parse_ack(resp: reqwest::Response) -> Result<Ack, Error> {
        let body = Self::checked_body(resp).await?;
        let ack = if body.trim().is_empty() {
            Ack::empty()
        } else {
            decode::<Ack>(&body)?
        };

        if ack.is_success() {
            Ok(ack)
        } else {
            Err(Error::Rejected {
                message: ack.text().map(str::to_owned),
            })
        }
    }
}

pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(body)),
        body: body.to_owned(),
    })
}
