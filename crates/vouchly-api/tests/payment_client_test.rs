#![allow(clippy::unwrap_used)]
// Integration tests for `PaymentClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vouchly_api::payment::VerifyRequest;
use vouchly_api::{Error, PaymentClient};

async fn setup() -> (MockServer, PaymentClient) {
    let server = MockServer::start().await;
    let client = PaymentClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
    );
    (server, client)
}

fn request() -> VerifyRequest {
    VerifyRequest {
        reference: "T123".into(),
        name: "Ama".into(),
        phone: "0241234567".into(),
        email: "ama@example.com".into(),
        kind: None,
    }
}

#[tokio::test]
async fn test_verify_success_returns_voucher() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/verify-payment"))
        .and(body_json(json!({
            "reference": "T123",
            "name": "Ama",
            "phone": "0241234567",
            "email": "ama@example.com"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "voucher": "SN001 | 4455"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client.verify(&request()).await.unwrap();

    assert!(resp.success);
    assert_eq!(resp.voucher.as_deref(), Some("SN001 | 4455"));
}

#[tokio::test]
async fn test_verify_failure_body_on_error_status() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/verify-payment"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": true,
            "message": "Payment not completed"
        })))
        .mount(&server)
        .await;

    let resp = client.verify(&request()).await.unwrap();

    assert!(!resp.success);
    assert_eq!(resp.message.as_deref(), Some("Payment not completed"));
}

#[tokio::test]
async fn test_verify_non_json_error_status() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/verify-payment"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client.verify(&request()).await.unwrap_err();

    assert!(matches!(err, Error::Http { status: 502, .. }), "got: {err:?}");
}
