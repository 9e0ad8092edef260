// vouchly-api: Async Rust client for the vouchly backend (admin console + payment verification)

pub mod admin;
pub mod error;
pub mod layout;
pub mod payment;
pub mod transport;

pub use admin::AdminClient;
pub use error::Error;
pub use layout::{ApiLayout, ListingMode, UploadEncoding};
pub use payment::PaymentClient;
pub use transport::{TlsMode, TransportConfig};
