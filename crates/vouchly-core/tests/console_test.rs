#![allow(clippy::unwrap_used)]
// Integration tests for `Console` against a wiremock backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vouchly_core::{
    Command, CommandResult, Console, ConsoleConfig, CoreError, ListingMode, MemoryTokenStore,
    SessionState, StatusFilter, StoredSession, TokenStore, VoucherFilter, VoucherId,
};

// ── Helpers ─────────────────────────────────────────────────────────

/// Memory store that counts `clear()` calls.
#[derive(Default)]
struct CountingStore {
    inner: MemoryTokenStore,
    clears: AtomicUsize,
}

impl TokenStore for CountingStore {
    fn load(&self) -> Result<Option<StoredSession>, CoreError> {
        self.inner.load()
    }

    fn save(&self, session: &StoredSession) -> Result<(), CoreError> {
        self.inner.save(session)
    }

    fn clear(&self) -> Result<(), CoreError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear()
    }
}

fn remembered(token: &str) -> StoredSession {
    StoredSession {
        token: Some(SecretString::from(token.to_owned())),
        remember: true,
    }
}

async fn setup(listing: ListingMode, tokens: Arc<dyn TokenStore>) -> (MockServer, Console) {
    let server = MockServer::start().await;
    let mut config = ConsoleConfig::new(Url::parse(&server.uri()).unwrap());
    config.listing = listing;
    let console = Console::new(config, tokens).unwrap();
    (server, console)
}

async fn logged_in(listing: ListingMode) -> (MockServer, Console) {
    let tokens = Arc::new(MemoryTokenStore::with_session(remembered("tok")));
    let (server, console) = setup(listing, tokens).await;
    assert!(console.restore().unwrap());
    (server, console)
}

fn voucher_list() -> serde_json::Value {
    json!({"vouchers": [
        {"id": 1, "serial": "WAE-001", "pin": "1111", "used": false},
        {"id": 2, "serial": "WAE-002", "pin": "2222", "used": true, "phone": "0244123456"},
        {"id": 3, "serial": "BEC-003", "pin": "3333", "used": false}
    ]})
}

async fn mount_stats(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/admin/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 3, "unused": 2, "used": 1})))
        .mount(server)
        .await;
}

// ── Session lifecycle ───────────────────────────────────────────────

#[tokio::test]
async fn test_login_with_remember_persists_token() {
    let tokens = Arc::new(MemoryTokenStore::new());
    let (server, console) = setup(ListingMode::Plain, tokens.clone()).await;

    Mock::given(method("POST"))
        .and(path("/admin/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "token": "fresh"})))
        .mount(&server)
        .await;

    console
        .login(None, &SecretString::from("pw".to_owned()), true)
        .await
        .unwrap();

    assert!(console.is_logged_in());
    let stored = tokens.load().unwrap().unwrap();
    assert_eq!(stored.token.unwrap().expose_secret(), "fresh");
    assert!(stored.remember);
}

#[tokio::test]
async fn test_login_without_remember_keeps_token_in_memory_only() {
    let tokens = Arc::new(MemoryTokenStore::with_session(remembered("old")));
    let (server, console) = setup(ListingMode::Plain, tokens.clone()).await;

    Mock::given(method("POST"))
        .and(path("/admin/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "session-only"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/stats"))
        .and(header("authorization", "Bearer session-only"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 0})))
        .expect(1)
        .mount(&server)
        .await;

    console
        .login(None, &SecretString::from("pw".to_owned()), false)
        .await
        .unwrap();

    assert!(tokens.load().unwrap().is_none());
    console.load_stats().await.unwrap();
}

#[tokio::test]
async fn test_failed_login_stays_logged_out() {
    let (server, console) = setup(ListingMode::Plain, Arc::new(MemoryTokenStore::new())).await;

    Mock::given(method("POST"))
        .and(path("/admin/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Wrong password"})))
        .mount(&server)
        .await;

    let err = console
        .login(None, &SecretString::from("bad".to_owned()), true)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::AuthenticationFailed { ref message } if message == "Wrong password"));
    assert!(!console.is_logged_in());
}

#[tokio::test]
async fn test_reads_require_login() {
    let (_server, console) = setup(ListingMode::Plain, Arc::new(MemoryTokenStore::new())).await;

    let err = console.load_stats().await.unwrap_err();

    assert!(matches!(err, CoreError::NotLoggedIn));
}

#[tokio::test]
async fn test_concurrent_401s_clear_token_exactly_once() {
    let tokens = Arc::new(CountingStore::default());
    tokens.save(&remembered("stale")).unwrap();
    let (server, console) = setup(ListingMode::Plain, tokens.clone()).await;
    console.restore().unwrap();

    for route in ["/admin/vouchers", "/admin/stats", "/admin/sales"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(20)))
            .mount(&server)
            .await;
    }

    let err = console.full_refresh().await.unwrap_err();

    assert!(matches!(err, CoreError::SessionExpired));
    assert_eq!(tokens.clears.load(Ordering::SeqCst), 1);
    assert_eq!(*console.session_state().borrow(), SessionState::Expired);
    assert!(tokens.load().unwrap().is_none());

    // Later calls fail fast without reaching the backend.
    let before = server.received_requests().await.unwrap().len();
    assert!(matches!(console.load_stats().await, Err(CoreError::SessionExpired)));
    assert_eq!(server.received_requests().await.unwrap().len(), before);
}

#[tokio::test]
async fn test_logout_clears_store_and_token() {
    let (server, console) = logged_in(ListingMode::Plain).await;
    mount_stats(&server).await;
    console.load_stats().await.unwrap();
    assert!(console.store().stats().is_some());

    console.logout();

    assert!(!console.is_logged_in());
    assert!(console.store().stats().is_none());
}

// ── Listing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_load_vouchers_filters_client_side() {
    let (server, console) = logged_in(ListingMode::Plain).await;

    Mock::given(method("GET"))
        .and(path("/admin/vouchers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(voucher_list()))
        .mount(&server)
        .await;

    let unused = console
        .load_vouchers(&VoucherFilter::new(StatusFilter::Unused, ""))
        .await
        .unwrap();
    let ids: Vec<String> = unused.iter().map(|v| v.id.to_string()).collect();
    assert_eq!(ids, ["1", "3"]);
    assert_eq!(console.store().voucher_count(), 3);

    let by_phone = console
        .load_vouchers(&VoucherFilter::new(StatusFilter::All, "0244"))
        .await
        .unwrap();
    assert_eq!(by_phone.len(), 1);
    assert_eq!(by_phone[0].serial, "WAE-002");
    assert_eq!(console.filtered_vouchers().len(), 1);
}

#[tokio::test]
async fn test_malformed_list_gives_generic_message() {
    let (server, console) = logged_in(ListingMode::Plain).await;

    Mock::given(method("GET"))
        .and(path("/admin/vouchers"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = console.load_vouchers(&VoucherFilter::default()).await.unwrap_err();

    assert_eq!(err.user_message(), "Unexpected response from server");
    assert!(console.is_logged_in());
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_mark_used_reloads_list_and_stats() {
    let (server, console) = logged_in(ListingMode::Plain).await;

    Mock::given(method("POST"))
        .and(path("/admin/mark-used"))
        .and(body_json(json!({"id": 1, "buyer": "0200000000"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "message": "Marked"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/vouchers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(voucher_list()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 3, "unused": 2, "used": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let result = console
        .execute(Command::MarkUsed {
            id: VoucherId::Numeric(1),
            buyer: Some(" 0200000000 ".into()),
        })
        .await
        .unwrap();

    assert_eq!(result, CommandResult::Ok { message: Some("Marked".into()) });
    assert_eq!(console.store().stats().unwrap().used, 1);
}

#[tokio::test]
async fn test_failed_mark_used_surfaces_message_without_reload() {
    let (server, console) = logged_in(ListingMode::Plain).await;

    Mock::given(method("POST"))
        .and(path("/admin/mark-used"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": false, "message": "Already used"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/vouchers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(voucher_list()))
        .expect(0)
        .mount(&server)
        .await;

    let err = console
        .execute(Command::MarkUsed { id: VoucherId::Numeric(2), buyer: None })
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Already used");
}

#[tokio::test]
async fn test_resend_does_not_reload_list() {
    let (server, console) = logged_in(ListingMode::Plain).await;

    Mock::given(method("POST"))
        .and(path("/admin/resend"))
        .and(body_json(json!({"id": "abc"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "message": "Sent"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/vouchers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(voucher_list()))
        .expect(0)
        .mount(&server)
        .await;

    let result = console
        .execute(Command::ResendVoucher { id: VoucherId::from("abc") })
        .await
        .unwrap();

    assert_eq!(result.summary("Resent"), "Sent");
}

#[tokio::test]
async fn test_duplicate_submission_is_rejected_while_pending() {
    let (server, console) = logged_in(ListingMode::Plain).await;

    Mock::given(method("DELETE"))
        .and(path("/admin/vouchers/5"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/vouchers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    mount_stats(&server).await;

    let first = console.execute(Command::DeleteVoucher { id: VoucherId::Numeric(5) });
    let second = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        console
            .execute(Command::DeleteVoucher { id: VoucherId::Numeric(5) })
            .await
    };
    let (first, second) = tokio::join!(first, second);

    assert!(first.is_ok());
    assert!(matches!(second, Err(CoreError::AlreadyInFlight { .. })));
}

#[tokio::test]
async fn test_add_voucher_requires_serial_and_pin() {
    let (server, console) = logged_in(ListingMode::Plain).await;

    let err = console
        .execute(Command::AddVoucher { serial: "  ".into(), pin: "1".into(), kind: None })
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Serial and pin required");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_voucher_posts_once_then_reloads_list_and_stats() {
    let (server, console) = logged_in(ListingMode::Plain).await;

    Mock::given(method("POST"))
        .and(path("/admin/vouchers"))
        .and(body_json(json!({"serial": "WAS001", "pin": "1234"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/vouchers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"vouchers": [
            {"id": 10, "serial": "WAS001", "pin": "1234", "used": false}
        ]})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 1, "unused": 1, "used": 0})))
        .expect(1)
        .mount(&server)
        .await;

    let result = console
        .execute(Command::AddVoucher {
            serial: " WAS001 ".into(),
            pin: "1234".into(),
            kind: None,
        })
        .await
        .unwrap();

    assert_eq!(result.summary("Voucher added"), "Voucher added");
    let requests = server.received_requests().await.unwrap();
    let calls: Vec<(String, String)> = requests
        .iter()
        .map(|r| (r.method.to_string(), r.url.path().to_owned()))
        .collect();
    assert_eq!(calls[0], ("POST".to_owned(), "/admin/vouchers".to_owned()));
    assert!(calls[1..].contains(&("GET".to_owned(), "/admin/vouchers".to_owned())));
    assert!(calls[1..].contains(&("GET".to_owned(), "/admin/stats".to_owned())));
    assert_eq!(console.store().voucher_count(), 1);
    assert_eq!(console.store().stats().unwrap().total, 1);
}

#[tokio::test]
async fn test_add_voucher_in_flight_ignores_surrounding_spaces() {
    let (server, console) = logged_in(ListingMode::Plain).await;

    Mock::given(method("POST"))
        .and(path("/admin/vouchers"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/vouchers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    mount_stats(&server).await;

    let add = |serial: &str| Command::AddVoucher {
        serial: serial.into(),
        pin: "1234".into(),
        kind: None,
    };
    let first = console.execute(add("WAS001"));
    let second = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        console.execute(add(" WAS001 ")).await
    };
    let (first, second) = tokio::join!(first, second);

    assert!(first.is_ok());
    assert!(matches!(second, Err(CoreError::AlreadyInFlight { .. })));
}

#[tokio::test]
async fn test_import_csv_uploads_valid_rows_once() {
    let (server, console) = logged_in(ListingMode::Plain).await;

    Mock::given(method("POST"))
        .and(path("/admin/upload"))
        .and(body_json(json!({"vouchers": [
            {"serial": "S1", "pin": "P1", "type": "WASSCE"},
            {"serial": "S2", "pin": "P2", "type": "BECE"}
        ]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "inserted": 2})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/vouchers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(voucher_list()))
        .mount(&server)
        .await;
    mount_stats(&server).await;

    let csv = "Serial,Pin,Type\r\nS1,P1,\r\nS2,P2,bece\r\n,P3,bece\r\n";
    let result = console.import_csv(csv, "batch.csv").await.unwrap();

    match result {
        CommandResult::Imported(report) => {
            assert_eq!(report.attempted, 2);
            assert_eq!(report.skipped, 1);
            assert_eq!(report.inserted, Some(2));
        }
        other => panic!("expected import report, got {other:?}"),
    }
}

#[tokio::test]
async fn test_import_with_no_valid_rows_sends_nothing() {
    let (server, console) = logged_in(ListingMode::Plain).await;

    let err = console
        .import_csv("serial,pin\n,\n", "empty.csv")
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::ValidationFailed { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}
