// Admin API surface
//
// Bearer-token authenticated routes under the configurable admin prefix.

pub mod auth;
pub mod client;
pub mod models;
pub mod reports;
pub mod vouchers;

pub use auth::LoginGrant;
pub use client::AdminClient;
pub use models::*;
