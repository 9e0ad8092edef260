//! Client-side logic for the vouchly voucher store, shared by the CLI and TUI.
//!
//! - **[`Console`]** -- Admin facade: [`login()`](Console::login) exchanges a
//!   password for a bearer token, reads populate the [`DataStore`], and
//!   [`execute()`](Console::execute) runs [`Command`]s. Any 401 clears the
//!   token and moves the session to [`SessionState::Expired`] exactly once.
//!
//! - **[`DataStore`]** -- Reactive storage (`DashMap` + `tokio::sync::watch`)
//!   holding the last fetched vouchers, sales and stats.
//!
//! - **[`Checkout`]** -- Buyer flow: validate contact details, open the hosted
//!   overlay through a [`PaymentGateway`], verify the reference, and build
//!   the confirmation URL.
//!
//! - Pure helpers: [`csv_import`], [`export`], [`html`], and the
//!   [`VoucherFilter`] applied to every list.

pub mod command;
pub mod config;
pub mod console;
pub mod convert;
pub mod csv_import;
pub mod error;
pub mod export;
pub mod html;
pub mod model;
pub mod payment;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{ActionKey, Command, CommandResult, ImportReport, RowAction};
pub use config::{
    ApiLayout, ConsoleConfig, DEFAULT_VOUCHER_TYPE, EmailPolicy, ListingMode, PaymentConfig,
    TlsVerification, UploadEncoding,
};
pub use console::Console;
pub use error::CoreError;
pub use model::{Sale, Voucher, VoucherCode, VoucherId, VoucherStats};
pub use payment::{
    BuyerDetails, Checkout, CheckoutRequest, Confirmation, GatewayOutcome, PaymentGateway,
    PaymentOutcome, PaymentState, ValidatedBuyer,
};
pub use session::{MemoryTokenStore, SessionState, StoredSession, TokenStore};
pub use store::DataStore;
pub use stream::{EntityStream, StatusFilter, VoucherFilter};
