// ── Buyer checkout ──
//
// Collect contact details, hand off to the hosted payment overlay, then
// ask the backend to verify the reference and reveal a voucher. The
// overlay itself is behind `PaymentGateway`; this module owns the state
// machine and the messages shown at each step.

use std::fmt;
use std::future::Future;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use url::Url;
use vouchly_api::PaymentClient;
use vouchly_api::payment::VerifyRequest;

use crate::config::{EmailPolicy, PaymentConfig, transport_for};
use crate::error::CoreError;
use crate::model::VoucherCode;

pub const CANCELLED_MESSAGE: &str = "Payment cancelled.";
pub const SUPPORT_MESSAGE: &str = "Error verifying payment. Please contact support.";
pub const MISSING_CONTACT_MESSAGE: &str = "Please enter your phone and email.";
pub const MISSING_PHONE_MESSAGE: &str = "Please enter your phone number.";

// ── Buyer details ────────────────────────────────────────────────────

/// Contact details as typed by the buyer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuyerDetails {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

/// Buyer details that passed validation; email is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedBuyer {
    pub name: String,
    pub phone: String,
    pub email: String,
}

impl BuyerDetails {
    pub fn validate(&self, policy: &EmailPolicy) -> Result<ValidatedBuyer, CoreError> {
        let name = self.name.trim().to_owned();
        let phone = self.phone.trim().to_owned();
        let email = self
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_owned);

        let email = match (policy, email) {
            (_, _) if phone.is_empty() => {
                let message = match policy {
                    EmailPolicy::Required => MISSING_CONTACT_MESSAGE,
                    EmailPolicy::Generated { .. } => MISSING_PHONE_MESSAGE,
                };
                return Err(CoreError::ValidationFailed {
                    message: message.into(),
                });
            }
            (_, Some(email)) => email,
            (EmailPolicy::Required, None) => {
                return Err(CoreError::ValidationFailed {
                    message: MISSING_CONTACT_MESSAGE.into(),
                });
            }
            (EmailPolicy::Generated { domain }, None) => {
                let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
                format!("{digits}@{domain}")
            }
        };

        Ok(ValidatedBuyer { name, phone, email })
    }
}

// ── Gateway seam ─────────────────────────────────────────────────────

/// Parameters handed to the hosted payment overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutRequest {
    pub key: String,
    pub email: String,
    /// Minor currency units.
    pub amount: u64,
    pub currency: String,
    pub metadata: ValidatedBuyer,
}

/// How the overlay was left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    Completed { reference: String },
    Cancelled,
}

/// The hosted payment overlay.
pub trait PaymentGateway: Send + Sync {
    fn open(
        &self,
        request: &CheckoutRequest,
    ) -> impl Future<Output = Result<GatewayOutcome, CoreError>> + Send;
}

// ── State machine ────────────────────────────────────────────────────

/// A verified purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub reference: String,
    pub code: VoucherCode,
    /// Confirmation page with `serial` and `pin` in the query string.
    pub redirect: Url,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentState {
    Idle,
    /// The overlay is open.
    InCheckout,
    AwaitingVerification { reference: String },
    Done(Confirmation),
    Failed { reason: String },
}

impl PaymentState {
    fn is_busy(&self) -> bool {
        matches!(self, Self::InCheckout | Self::AwaitingVerification { .. })
    }
}

/// Terminal result of one checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Confirmed(Confirmation),
    /// The buyer closed the overlay; their details are kept for a retry.
    Cancelled,
    Failed { reason: String },
}

impl fmt::Display for PaymentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confirmed(c) => write!(f, "Payment verified. Voucher: {}", c.code),
            Self::Cancelled => f.write_str(CANCELLED_MESSAGE),
            Self::Failed { reason } => f.write_str(reason),
        }
    }
}

/// Build the confirmation-page URL carrying the revealed voucher.
pub fn confirmation_url(
    site: &Url,
    success_page: &str,
    code: &VoucherCode,
) -> Result<Url, CoreError> {
    let mut url = site.join(success_page).map_err(|e| CoreError::Config {
        message: format!("invalid success page '{success_page}': {e}"),
    })?;
    url.set_query(None);
    url.query_pairs_mut()
        .append_pair("serial", &code.serial)
        .append_pair("pin", &code.pin);
    Ok(url)
}

/// Drives one buyer through checkout and verification.
pub struct Checkout {
    client: PaymentClient,
    config: PaymentConfig,
    state: watch::Sender<PaymentState>,
}

impl Checkout {
    pub fn new(config: PaymentConfig) -> Result<Self, CoreError> {
        let transport = transport_for(&config.tls, config.timeout);
        let client = PaymentClient::new(config.site_url.clone(), &transport)?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: PaymentClient, config: PaymentConfig) -> Self {
        let (state, _) = watch::channel(PaymentState::Idle);
        Self {
            client,
            config,
            state,
        }
    }

    pub fn config(&self) -> &PaymentConfig {
        &self.config
    }

    pub fn state(&self) -> watch::Receiver<PaymentState> {
        self.state.subscribe()
    }

    pub fn current_state(&self) -> PaymentState {
        self.state.borrow().clone()
    }

    pub fn checkout_request(&self, buyer: &ValidatedBuyer) -> CheckoutRequest {
        CheckoutRequest {
            key: self.config.public_key.clone(),
            email: buyer.email.clone(),
            amount: self.config.amount_minor,
            currency: self.config.currency.clone(),
            metadata: buyer.clone(),
        }
    }

    /// Move into `next` unless another attempt is already running.
    fn begin(&self, next: PaymentState) -> Result<(), CoreError> {
        let mut started = false;
        self.state.send_if_modified(|state| {
            if state.is_busy() {
                return false;
            }
            *state = next;
            started = true;
            true
        });
        if started {
            Ok(())
        } else {
            Err(CoreError::AlreadyInFlight {
                action: "A payment".into(),
            })
        }
    }

    /// Validate, open the overlay and verify the result.
    ///
    /// Validation failures and a concurrent attempt are errors; everything
    /// after the overlay opens ends in a [`PaymentOutcome`].
    pub async fn start<G: PaymentGateway>(
        &self,
        gateway: &G,
        buyer: &BuyerDetails,
    ) -> Result<PaymentOutcome, CoreError> {
        let buyer = buyer.validate(&self.config.email_policy)?;
        let request = self.checkout_request(&buyer);

        self.begin(PaymentState::InCheckout)?;
        debug!(amount = request.amount, currency = %request.currency, "opening checkout");

        match gateway.open(&request).await {
            Ok(GatewayOutcome::Completed { reference }) => match required_reference(&reference) {
                // The checkout is still claimed; hand it straight to verification.
                Ok(reference) => {
                    self.state.send_replace(PaymentState::AwaitingVerification {
                        reference: reference.clone(),
                    });
                    Ok(self.verify_claimed(reference, &buyer).await)
                }
                Err(e) => {
                    self.state.send_replace(PaymentState::Idle);
                    Err(e)
                }
            },
            Ok(GatewayOutcome::Cancelled) => {
                info!("checkout cancelled by buyer");
                self.state.send_replace(PaymentState::Idle);
                Ok(PaymentOutcome::Cancelled)
            }
            Err(e) => {
                warn!(error = %e, "payment overlay failed");
                let reason = e.user_message();
                self.state.send_replace(PaymentState::Failed {
                    reason: reason.clone(),
                });
                Ok(PaymentOutcome::Failed { reason })
            }
        }
    }

    /// Verify a completed reference with the backend.
    pub async fn verify(
        &self,
        reference: &str,
        buyer: &ValidatedBuyer,
    ) -> Result<PaymentOutcome, CoreError> {
        let reference = required_reference(reference)?;
        self.begin(PaymentState::AwaitingVerification {
            reference: reference.clone(),
        })?;
        Ok(self.verify_claimed(reference, buyer).await)
    }

    /// Post the reference; the state must already be `AwaitingVerification`.
    async fn verify_claimed(&self, reference: String, buyer: &ValidatedBuyer) -> PaymentOutcome {
        let request = VerifyRequest {
            reference: reference.clone(),
            name: buyer.name.clone(),
            phone: buyer.phone.clone(),
            email: buyer.email.clone(),
            kind: self.config.voucher_type.clone(),
        };

        let outcome = match self.client.verify(&request).await {
            Ok(resp) if resp.success => match resp.voucher.as_deref().and_then(VoucherCode::parse) {
                Some(code) => {
                    match confirmation_url(&self.config.site_url, &self.config.success_page, &code)
                    {
                        Ok(redirect) => {
                            info!(%reference, "payment verified");
                            PaymentOutcome::Confirmed(Confirmation {
                                reference,
                                code,
                                redirect,
                            })
                        }
                        Err(e) => {
                            warn!(error = %e, "cannot build confirmation url");
                            PaymentOutcome::Failed {
                                reason: SUPPORT_MESSAGE.into(),
                            }
                        }
                    }
                }
                None => {
                    warn!(voucher = ?resp.voucher, "verified payment returned a malformed voucher");
                    PaymentOutcome::Failed {
                        reason: SUPPORT_MESSAGE.into(),
                    }
                }
            },
            Ok(resp) => PaymentOutcome::Failed {
                reason: format!(
                    "Verification failed: {}",
                    resp.message.as_deref().unwrap_or("unknown error")
                ),
            },
            Err(e) => {
                warn!(error = %e, "verify-payment request failed");
                PaymentOutcome::Failed {
                    reason: SUPPORT_MESSAGE.into(),
                }
            }
        };

        self.state.send_replace(match &outcome {
            PaymentOutcome::Confirmed(c) => PaymentState::Done(c.clone()),
            PaymentOutcome::Failed { reason } => PaymentState::Failed {
                reason: reason.clone(),
            },
            PaymentOutcome::Cancelled => PaymentState::Idle,
        });
        outcome
    }
}

fn required_reference(reference: &str) -> Result<String, CoreError> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(CoreError::ValidationFailed {
            message: "Payment reference is required.".into(),
        });
    }
    Ok(reference.to_owned())
}
