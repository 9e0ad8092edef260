#![allow(clippy::unwrap_used)]
// Integration tests for the buyer `Checkout` flow against a wiremock backend.

use std::sync::Mutex;
use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vouchly_core::payment::{CANCELLED_MESSAGE, SUPPORT_MESSAGE};
use vouchly_core::{
    BuyerDetails, Checkout, CheckoutRequest, CoreError, GatewayOutcome, PaymentConfig,
    PaymentGateway, PaymentOutcome, PaymentState,
};

/// Gateway that records the request and answers with a fixed outcome.
struct ScriptedGateway {
    outcome: GatewayOutcome,
    delay: Duration,
    seen: Mutex<Vec<CheckoutRequest>>,
}

impl ScriptedGateway {
    fn new(outcome: GatewayOutcome) -> Self {
        Self {
            outcome,
            delay: Duration::ZERO,
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl PaymentGateway for ScriptedGateway {
    async fn open(&self, request: &CheckoutRequest) -> Result<GatewayOutcome, CoreError> {
        self.seen.lock().unwrap().push(request.clone());
        tokio::time::sleep(self.delay).await;
        Ok(self.outcome.clone())
    }
}

fn completed(reference: &str) -> GatewayOutcome {
    GatewayOutcome::Completed {
        reference: reference.into(),
    }
}

fn buyer() -> BuyerDetails {
    BuyerDetails {
        name: "Ama Mensah".into(),
        phone: "0241234567".into(),
        email: Some("ama@example.com".into()),
    }
}

async fn setup() -> (MockServer, Checkout) {
    let server = MockServer::start().await;
    let config = PaymentConfig::new(Url::parse(&server.uri()).unwrap(), "pk_test_123");
    (server, Checkout::new(config).unwrap())
}

#[tokio::test]
async fn test_successful_payment_builds_confirmation_url() {
    let (server, checkout) = setup().await;

    Mock::given(method("POST"))
        .and(path("/verify-payment"))
        .and(body_json(json!({
            "reference": "T-100",
            "name": "Ama Mensah",
            "phone": "0241234567",
            "email": "ama@example.com"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "voucher": "WAE 001 | 12&34"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = ScriptedGateway::new(completed("T-100"));
    let outcome = checkout.start(&gateway, &buyer()).await.unwrap();

    let PaymentOutcome::Confirmed(confirmation) = outcome else {
        panic!("expected confirmation, got {outcome:?}");
    };
    assert_eq!(confirmation.code.serial, "WAE 001");
    assert_eq!(confirmation.code.pin, "12&34");
    assert_eq!(confirmation.redirect.path(), "/success.html");
    assert_eq!(confirmation.redirect.query(), Some("serial=WAE+001&pin=12%2634"));
    assert!(matches!(checkout.current_state(), PaymentState::Done(_)));

    let seen = gateway.seen.lock().unwrap();
    assert_eq!(seen[0].amount, 250_000);
    assert_eq!(seen[0].currency, "GHS");
    assert_eq!(seen[0].key, "pk_test_123");
}

#[tokio::test]
async fn test_cancelled_overlay_makes_no_request() {
    let (server, checkout) = setup().await;

    let outcome = checkout
        .start(&ScriptedGateway::new(GatewayOutcome::Cancelled), &buyer())
        .await
        .unwrap();

    assert_eq!(outcome, PaymentOutcome::Cancelled);
    assert_eq!(outcome.to_string(), CANCELLED_MESSAGE);
    assert_eq!(checkout.current_state(), PaymentState::Idle);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_contact_details_never_open_overlay() {
    let (_server, checkout) = setup().await;
    let gateway = ScriptedGateway::new(completed("T-1"));
    let details = BuyerDetails {
        email: None,
        ..buyer()
    };

    let err = checkout.start(&gateway, &details).await.unwrap_err();

    assert_eq!(err.to_string(), "Please enter your phone and email.");
    assert!(gateway.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unsuccessful_verification_shows_server_message() {
    let (server, checkout) = setup().await;

    Mock::given(method("POST"))
        .and(path("/verify-payment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Transaction not found"
        })))
        .mount(&server)
        .await;

    let outcome = checkout
        .start(&ScriptedGateway::new(completed("T-404")), &buyer())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        PaymentOutcome::Failed {
            reason: "Verification failed: Transaction not found".into()
        }
    );
}

#[tokio::test]
async fn test_transport_failure_asks_buyer_to_contact_support() {
    let (server, checkout) = setup().await;

    Mock::given(method("POST"))
        .and(path("/verify-payment"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .mount(&server)
        .await;

    let outcome = checkout
        .start(&ScriptedGateway::new(completed("T-5")), &buyer())
        .await
        .unwrap();

    assert_eq!(outcome.to_string(), SUPPORT_MESSAGE);
    assert!(matches!(checkout.current_state(), PaymentState::Failed { .. }));
}

#[tokio::test]
async fn test_voucher_without_separator_is_a_failure_not_a_panic() {
    let (server, checkout) = setup().await;

    Mock::given(method("POST"))
        .and(path("/verify-payment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "voucher": "WAE001-1234"
        })))
        .mount(&server)
        .await;

    let outcome = checkout
        .start(&ScriptedGateway::new(completed("T-6")), &buyer())
        .await
        .unwrap();

    assert!(matches!(outcome, PaymentOutcome::Failed { .. }));
}

#[tokio::test]
async fn test_second_checkout_rejected_while_first_is_open() {
    let (server, checkout) = setup().await;

    Mock::given(method("POST"))
        .and(path("/verify-payment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "voucher": "S | P"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let slow = ScriptedGateway {
        delay: Duration::from_millis(150),
        ..ScriptedGateway::new(completed("T-7"))
    };
    let fast = ScriptedGateway::new(completed("T-8"));
    let details = buyer();

    let first = checkout.start(&slow, &details);
    let second = async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        checkout.start(&fast, &details).await
    };
    let (first, second) = tokio::join!(first, second);

    assert!(matches!(first, Ok(PaymentOutcome::Confirmed(_))));
    assert!(matches!(second, Err(CoreError::AlreadyInFlight { .. })));
}

#[tokio::test]
async fn test_completed_checkout_moves_straight_to_verification() {
    let (server, checkout) = setup().await;

    Mock::given(method("POST"))
        .and(path("/verify-payment"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "voucher": "S9 | P9"}))
                .set_delay(Duration::from_millis(150)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut states = checkout.state();
    let observer = async {
        let mut seen = Vec::new();
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            let finished = matches!(state, PaymentState::Done(_) | PaymentState::Failed { .. });
            seen.push(state);
            if finished {
                break;
            }
        }
        seen
    };
    let details = buyer();
    let intruder = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        checkout
            .start(&ScriptedGateway::new(completed("T-10")), &details)
            .await
    };
    let gateway = ScriptedGateway::new(completed(" T-9 "));

    let (outcome, intruder, seen) =
        tokio::join!(checkout.start(&gateway, &details), intruder, observer);

    assert!(matches!(outcome, Ok(PaymentOutcome::Confirmed(_))));
    assert!(matches!(intruder, Err(CoreError::AlreadyInFlight { .. })));
    assert!(!seen.contains(&PaymentState::Idle), "states: {seen:?}");
    assert!(seen.contains(&PaymentState::AwaitingVerification {
        reference: "T-9".into()
    }));
}
