//! Buyer checkout handlers.
//!
//! `pay start` stands in for the hosted overlay with a terminal prompt: it
//! shows the checkout parameters, the buyer pays with the provider, and the
//! returned reference is typed back in. `pay verify` skips straight to
//! verification for a reference obtained elsewhere.

use std::io::IsTerminal;

use serde::Serialize;

use vouchly_core::{
    BuyerDetails, Checkout, CheckoutRequest, CoreError, GatewayOutcome, PaymentGateway,
    PaymentOutcome,
};

use crate::cli::{BuyerArgs, GlobalOpts, PayArgs, PayCommand};
use crate::config::{self, Profile};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Terminal gateway ────────────────────────────────────────────────

/// Collects the provider's reference from the operator's terminal.
struct TerminalGateway;

fn format_amount(minor: u64, currency: &str) -> String {
    format!("{currency} {}.{:02}", minor / 100, minor % 100)
}

impl PaymentGateway for TerminalGateway {
    async fn open(&self, request: &CheckoutRequest) -> Result<GatewayOutcome, CoreError> {
        eprintln!("Checkout");
        eprintln!("  Amount : {}", format_amount(request.amount, &request.currency));
        eprintln!("  Email  : {}", request.email);
        eprintln!("  Phone  : {}", request.metadata.phone);
        eprintln!("  Key    : {}", request.key);
        eprintln!("Complete the payment with the provider, then enter its reference.");

        let typed = tokio::task::spawn_blocking(|| {
            dialoguer::Input::<String>::new()
                .with_prompt("Payment reference (empty to cancel)")
                .allow_empty(true)
                .interact_text()
        })
        .await
        .map_err(|e| CoreError::Internal(format!("prompt task failed: {e}")))?
        .map_err(|e| CoreError::Internal(format!("prompt failed: {e}")))?;

        let reference = typed.trim();
        Ok(if reference.is_empty() {
            GatewayOutcome::Cancelled
        } else {
            GatewayOutcome::Completed {
                reference: reference.to_owned(),
            }
        })
    }
}

// ── Output ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Revealed {
    reference: String,
    serial: String,
    pin: String,
    confirmation_url: String,
}

fn buyer_details(args: BuyerArgs) -> BuyerDetails {
    BuyerDetails {
        name: args.name,
        phone: args.phone,
        email: args.email,
    }
}

fn finish(outcome: PaymentOutcome, global: &GlobalOpts) -> Result<(), CliError> {
    match outcome {
        PaymentOutcome::Confirmed(confirmation) => {
            let revealed = Revealed {
                reference: confirmation.reference,
                serial: confirmation.code.serial,
                pin: confirmation.code.pin,
                confirmation_url: confirmation.redirect.to_string(),
            };
            let out = output::render_single(
                &global.output,
                &revealed,
                |r| {
                    format!(
                        "Serial: {}\nPIN:    {}\nPage:   {}",
                        r.serial, r.pin, r.confirmation_url
                    )
                },
                |r| r.confirmation_url.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
        PaymentOutcome::Cancelled => {
            if !global.quiet {
                eprintln!("{}", PaymentOutcome::Cancelled);
            }
            Ok(())
        }
        PaymentOutcome::Failed { reason } => Err(CliError::Rejected { message: reason }),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    args: PayArgs,
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let checkout = Checkout::new(config::payment_config(profile, profile_name, global)?)?;

    match args.command {
        PayCommand::Start(buyer) => {
            if !std::io::stdin().is_terminal() {
                return Err(CliError::Validation {
                    field: "pay start".into(),
                    reason: "needs an interactive terminal; use `vouchly pay verify <REFERENCE>`"
                        .into(),
                });
            }
            let outcome = checkout.start(&TerminalGateway, &buyer_details(buyer)).await?;
            finish(outcome, global)
        }

        PayCommand::Verify { reference, buyer } => {
            let buyer = buyer_details(buyer).validate(&checkout.config().email_policy)?;
            let spinner = util::spinner("Verifying payment...", global.quiet);
            let outcome = checkout.verify(&reference, &buyer).await;
            spinner.finish_and_clear();
            finish(outcome?, global)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_render_in_major_units() {
        assert_eq!(format_amount(250_000, "GHS"), "GHS 2500.00");
        assert_eq!(format_amount(1_005, "GHS"), "GHS 10.05");
    }
}
