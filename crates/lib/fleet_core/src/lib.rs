//! # fleet_core
//!
//! Core authentication logic for Fleet: user and device login, account
//! lockout, password-hash migration and token issuance.

pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod ids;
pub mod models;
pub mod store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
