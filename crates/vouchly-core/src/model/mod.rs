// ── Domain model ──
//
// Canonical types handed to the CLI and TUI. Wire shapes from
// `vouchly-api` are converted into these in `convert.rs`.

mod sale;
mod stats;
mod voucher;
mod voucher_id;

pub use sale::{Sale, VoucherCode};
pub use stats::VoucherStats;
pub use voucher::Voucher;
pub use voucher_id::VoucherId;
