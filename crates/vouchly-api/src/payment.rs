// Payment verification client
//
// Public (unauthenticated) endpoint that confirms a hosted-checkout
// reference with the backend and, on success, reveals the voucher.

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::admin::client::decode;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Body for `POST /verify-payment`.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyRequest {
    pub reference: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Answer from `POST /verify-payment`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyResponse {
    #[serde(default)]
    pub success: bool,
    /// `"<serial> | <pin>"`
    #[serde(default)]
    pub voucher: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// HTTP client for the site's payment verification endpoint.
pub struct PaymentClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PaymentClient {
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self::with_client(transport.build_client()?, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `POST /verify-payment`
    ///
    /// Non-2xx answers that still carry a JSON body are returned as an
    /// unsuccessful [`VerifyResponse`] so the caller can show the server's
    /// message; bodies that are not JSON fail with [`Error::Http`].
    pub async fn verify(&self, request: &VerifyRequest) -> Result<VerifyResponse, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let url = Url::parse(&format!("{base}/verify-payment"))?;
        debug!(reference = %request.reference, "verifying payment at {}", url);

        let resp = self.http.post(url).json(request).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status.is_success() {
            return decode(&body);
        }

        match serde_json::from_str::<VerifyResponse>(&body) {
            Ok(parsed) => Ok(VerifyResponse {
                success: false,
                ..parsed
            }),
            Err(_) => Err(Error::Http {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            }),
        }
    }
}
