//! Authentication and login throttling.
//!
//! Provides password hashing, device fingerprints, JWT issuance, the
//! account-lockout throttle and the [`service::AuthService`] that ties them
//! together.

pub mod fingerprint;
pub mod jwt;
pub mod password;
pub mod service;
pub mod throttle;

use thiserror::Error;

use crate::cache::CacheError;
use crate::models::auth::User;
use crate::store::StoreError;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown identifier, wrong password or an active lockout. The three
    /// causes are deliberately indistinguishable.
    #[error("Invalid credentials")]
    Unauthorized,

    #[error("User not confirmed")]
    UserNotConfirmed,

    #[error("User not found: {id}")]
    UserNotFound {
        id: String,
        #[source]
        source: Option<StoreError>,
    },

    #[error("Failed to update user {}", .user.id)]
    UserUpdate {
        user: Box<User>,
        #[source]
        source: StoreError,
    },

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Password hash error: {0}")]
    Hash(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// A failed user login.
///
/// `lockout` is the unix timestamp until which the account is locked for the
/// requesting source, or `0`. It is kept beside the error rather than inside
/// it so that `Unauthorized` stays uniform for every cause.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct LoginError {
    pub error: AuthError,
    pub lockout: i64,
}

impl LoginError {
    pub fn new(error: AuthError, lockout: i64) -> Self {
        Self { error, lockout }
    }
}

impl From<AuthError> for LoginError {
    fn from(error: AuthError) -> Self {
        Self { error, lockout: 0 }
    }
}

impl From<StoreError> for LoginError {
    fn from(e: StoreError) -> Self {
        AuthError::from(e).into()
    }
}

impl From<CacheError> for LoginError {
    fn from(e: CacheError) -> Self {
        AuthError::from(e).into()
    }
}
