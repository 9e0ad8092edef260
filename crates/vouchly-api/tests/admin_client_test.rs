#![allow(clippy::unwrap_used)]
// Integration tests for `AdminClient` using wiremock.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vouchly_api::admin::{MarkUsedRequest, NewVoucher, RawId, UploadRow, VoucherQuery, VoucherRef};
use vouchly_api::{AdminClient, ApiLayout, Error, ListingMode};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup(layout: ApiLayout) -> (MockServer, AdminClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = AdminClient::with_client(reqwest::Client::new(), base_url, layout);
    (server, client)
}

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_owned())
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_login_installs_token() {
    let (server, client) = setup(ApiLayout::Prefixed).await;

    Mock::given(method("POST"))
        .and(path("/admin/login"))
        .and(body_json(json!({"password": "hunter2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "token": "tok-1"})))
        .mount(&server)
        .await;

    let grant = client.login(None, &secret("hunter2")).await.unwrap();

    assert_eq!(grant.token.unwrap().expose_secret(), "tok-1");
    assert!(client.has_token());
}

#[tokio::test]
async fn test_login_namespaced_with_username() {
    let (server, client) = setup(ApiLayout::Namespaced).await;

    Mock::given(method("POST"))
        .and(path("/admin/api/login"))
        .and(body_json(json!({"username": "ops", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc"})))
        .expect(1)
        .mount(&server)
        .await;

    client.login(Some("ops"), &secret("pw")).await.unwrap();
}

#[tokio::test]
async fn test_login_success_without_token() {
    let (server, client) = setup(ApiLayout::Prefixed).await;

    Mock::given(method("POST"))
        .and(path("/admin/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let grant = client.login(None, &secret("pw")).await.unwrap();

    assert!(grant.token.is_none());
    assert!(!client.has_token());
}

#[tokio::test]
async fn test_login_rejected_carries_server_message() {
    let (server, client) = setup(ApiLayout::Prefixed).await;

    Mock::given(method("POST"))
        .and(path("/admin/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"success": false, "message": "Invalid password"})),
        )
        .mount(&server)
        .await;

    let err = client.login(None, &secret("nope")).await.unwrap_err();

    match err {
        Error::Authentication { message } => assert_eq!(message, "Invalid password"),
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

// ── Bearer header ───────────────────────────────────────────────────

#[tokio::test]
async fn test_bearer_header_attached_when_token_present() {
    let (server, client) = setup(ApiLayout::Prefixed).await;
    client.set_token(secret("tok-9"));

    Mock::given(method("GET"))
        .and(path("/admin/stats"))
        .and(header("authorization", "Bearer tok-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 5, "unused": 4, "used": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let stats = client.stats().await.unwrap();
    assert_eq!((stats.total, stats.unused, stats.used), (5, 4, 1));
}

#[tokio::test]
async fn test_no_authorization_header_without_token() {
    let (server, client) = setup(ApiLayout::Prefixed).await;

    Mock::given(method("GET"))
        .and(path("/admin/sales"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sales": []})))
        .mount(&server)
        .await;

    client.list_sales().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_unauthorized_maps_to_error() {
    let (server, client) = setup(ApiLayout::Prefixed).await;
    client.set_token(secret("stale"));

    Mock::given(method("GET"))
        .and(path("/admin/vouchers"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "expired"})))
        .mount(&server)
        .await;

    let err = client
        .list_vouchers(ListingMode::Plain, VoucherQuery::default())
        .await
        .unwrap_err();

    assert!(err.is_unauthorized(), "expected Unauthorized, got: {err:?}");
}

// ── Vouchers ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_vouchers_query_mode_sends_params() {
    let (server, client) = setup(ApiLayout::Prefixed).await;

    Mock::given(method("GET"))
        .and(path("/admin/vouchers"))
        .and(query_param("status", "unused"))
        .and(query_param("search", "024"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 3, "serial": "S3", "pin": "P3", "status": "unused"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let list = client
        .list_vouchers(
            ListingMode::Query,
            VoucherQuery { status: Some("unused"), search: Some("024") },
        )
        .await
        .unwrap();

    assert_eq!(list.len(), 1);
    assert!(!list[0].is_used());
}

#[tokio::test]
async fn test_list_vouchers_plain_mode_bare_array() {
    let (server, client) = setup(ApiLayout::Namespaced).await;

    Mock::given(method("GET"))
        .and(path("/admin/api/vouchers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "a1", "serial": "S1", "pin": "P1", "used": true},
            {"id": "a2", "serial": "S2", "pin": "P2", "used": false}
        ])))
        .mount(&server)
        .await;

    let list = client
        .list_vouchers(
            ListingMode::Plain,
            VoucherQuery { status: Some("used"), search: None },
        )
        .await
        .unwrap();

    assert_eq!(list.len(), 2);
    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].url.query().is_none());
}

#[tokio::test]
async fn test_malformed_list_is_deserialization_error() {
    let (server, client) = setup(ApiLayout::Prefixed).await;

    Mock::given(method("GET"))
        .and(path("/admin/vouchers"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client
        .list_vouchers(ListingMode::Plain, VoucherQuery::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Deserialization { .. }), "got: {err:?}");
}

#[tokio::test]
async fn test_list_tolerates_numeric_fields_and_null_list() {
    let (server, client) = setup(ApiLayout::Prefixed).await;

    Mock::given(method("GET"))
        .and(path("/admin/vouchers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "vouchers": [{"id": 1, "serial": "WAS001", "pin": 1234, "used": false}]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/vouchers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"vouchers": null})))
        .mount(&server)
        .await;

    let first = client
        .list_vouchers(ListingMode::Plain, VoucherQuery::default())
        .await
        .unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].pin.as_deref(), Some("1234"));

    let second = client
        .list_vouchers(ListingMode::Plain, VoucherQuery::default())
        .await
        .unwrap();
    assert!(second.is_empty());
}

#[tokio::test]
async fn test_add_voucher_omits_missing_type() {
    let (server, client) = setup(ApiLayout::Prefixed).await;

    Mock::given(method("POST"))
        .and(path("/admin/vouchers"))
        .and(body_json(json!({"serial": "S9", "pin": "P9"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "message": "Added"})))
        .expect(1)
        .mount(&server)
        .await;

    let ack = client
        .add_voucher(&NewVoucher { serial: "S9".into(), pin: "P9".into(), kind: None })
        .await
        .unwrap();

    assert_eq!(ack.text(), Some("Added"));
}

#[tokio::test]
async fn test_upload_sends_single_request_with_all_rows() {
    let (server, client) = setup(ApiLayout::Prefixed).await;

    Mock::given(method("POST"))
        .and(path("/admin/upload"))
        .and(body_json(json!({"vouchers": [
            {"serial": "A", "pin": "1", "type": "WASSCE"},
            {"serial": "B", "pin": "2", "type": "BECE"}
        ]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "inserted": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let rows = vec![
        UploadRow { serial: "A".into(), pin: "1".into(), kind: "WASSCE".into() },
        UploadRow { serial: "B".into(), pin: "2".into(), kind: "BECE".into() },
    ];
    let ack = client.upload_vouchers(&rows).await.unwrap();

    assert_eq!(ack.inserted, Some(2));
}

#[tokio::test]
async fn test_upload_multipart_carries_csv_file() {
    let (server, client) = setup(ApiLayout::Prefixed).await;

    Mock::given(method("POST"))
        .and(path("/admin/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"inserted": 1})))
        .mount(&server)
        .await;

    let rows = vec![UploadRow { serial: "A".into(), pin: "1".into(), kind: "WASSCE".into() }];
    client.upload_vouchers_multipart("batch.csv", &rows).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("serial,pin,type\nA,1,WASSCE\n"));
}

#[tokio::test]
async fn test_mark_used_rejection_surfaces_message() {
    let (server, client) = setup(ApiLayout::Prefixed).await;

    Mock::given(method("POST"))
        .and(path("/admin/mark-used"))
        .and(body_json(json!({"id": 7, "buyer": "0200000000"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": false, "message": "Already used"})),
        )
        .mount(&server)
        .await;

    let err = client
        .mark_used(&MarkUsedRequest {
            target: VoucherRef::Id(RawId::Number(7)),
            buyer: Some("0200000000".into()),
        })
        .await
        .unwrap_err();

    assert_eq!(err.server_message(), Some("Already used"));
}

#[tokio::test]
async fn test_delete_with_empty_body_is_success() {
    let (server, client) = setup(ApiLayout::Prefixed).await;

    Mock::given(method("DELETE"))
        .and(path("/admin/vouchers/abc"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_voucher(&RawId::Text("abc".into())).await.unwrap();
}

#[tokio::test]
async fn test_resend_http_error_message() {
    let (server, client) = setup(ApiLayout::Prefixed).await;

    Mock::given(method("POST"))
        .and(path("/admin/resend"))
        .and(body_json(json!({"id": 12})))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "SMS gateway down"})))
        .mount(&server)
        .await;

    let err = client.resend_voucher(&RawId::Number(12)).await.unwrap_err();

    match err {
        Error::Http { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "SMS gateway down");
        }
        other => panic!("expected Http error, got: {other:?}"),
    }
}
