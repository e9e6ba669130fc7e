//! Domain models.

pub mod auth;
pub mod device;
pub mod namespace;
