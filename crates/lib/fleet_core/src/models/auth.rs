//! User accounts, login requests and the responses handed back to the API layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub name: String,
    /// bcrypt hash, or a legacy SHA-256 hex digest awaiting migration.
    pub password_hash: String,
    pub confirmed: bool,
    pub last_login: DateTime<Utc>,
    pub mfa_enabled: bool,
}

/// Second-factor state surfaced to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mfa {
    /// The account has MFA turned on.
    pub enable: bool,
    /// The second factor has already been passed for this token.
    pub validate: bool,
}

/// Username/email + password login.
#[derive(Debug, Clone, Deserialize)]
pub struct UserAuthRequest {
    /// Username or email address.
    pub identifier: String,
    pub password: String,
}

/// Result of a successful user authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAuthResponse {
    pub id: String,
    pub name: String,
    /// Username.
    pub user: String,
    pub email: String,
    pub tenant: String,
    pub role: String,
    pub token: String,
    pub mfa: Mfa,
}

/// JWT claims embedded in user tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    /// Subject (user ID).
    pub id: String,
    pub username: String,
    pub tenant: String,
    pub role: String,
    pub mfa: Mfa,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

/// JWT claims embedded in device tokens. Device tokens do not expire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceClaims {
    /// Device fingerprint.
    pub uid: String,
    pub tenant: String,
    pub iat: i64,
}

/// Claim sets the token issuer knows how to sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "claims", rename_all = "lowercase")]
pub enum Claims {
    User(UserClaims),
    Device(DeviceClaims),
}
