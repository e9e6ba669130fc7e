//! JWT token generation and verification.

use std::path::{Path, PathBuf};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::{info, warn};

use super::AuthError;
use crate::models::auth::{Claims, DeviceClaims, UserClaims};

/// Signs claim sets into bearer tokens.
pub trait TokenIssuer: Send + Sync {
    fn sign(&self, claims: &Claims) -> Result<String, AuthError>;
}

/// HS256 issuer.
pub struct JwtIssuer {
    secret: Vec<u8>,
}

impl JwtIssuer {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: secret.to_vec(),
        }
    }

    /// Verify a user token, returning the claims on success.
    pub fn verify_user_token(&self, token: &str) -> Option<UserClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        match self.decode(token, &validation)? {
            Claims::User(claims) => Some(claims),
            Claims::Device(_) => None,
        }
    }

    /// Verify a device token. Device tokens carry no expiry.
    pub fn verify_device_token(&self, token: &str) -> Option<DeviceClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        match self.decode(token, &validation)? {
            Claims::Device(claims) => Some(claims),
            Claims::User(_) => None,
        }
    }

    fn decode(&self, token: &str, validation: &Validation) -> Option<Claims> {
        let key = DecodingKey::from_secret(&self.secret);
        decode::<Claims>(token, &key, validation)
            .ok()
            .map(|data| data.claims)
    }
}

impl TokenIssuer for JwtIssuer {
    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|e| AuthError::Token(format!("jwt encode: {e}")))
    }
}

/// Resolve the JWT secret: env var `JWT_SECRET` → persisted file.
pub fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    load_or_create_secret(&jwt_secret_path())
}

/// Read the secret at `path`, generating and persisting a new one when the
/// file is missing or empty.
pub fn load_or_create_secret(path: &Path) -> String {
    if let Ok(existing) = std::fs::read_to_string(path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match std::fs::write(path, &secret) {
        Ok(()) => info!(path = %path.display(), "generated new JWT secret"),
        Err(e) => warn!(path = %path.display(), "could not persist JWT secret: {e}"),
    }
    secret
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fleet")
        .join("jwt-secret")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Mfa;
    use chrono::Utc;

    fn user_claims(exp_offset: i64) -> Claims {
        let now = Utc::now().timestamp();
        Claims::User(UserClaims {
            id: "id".into(),
            username: "john_doe".into(),
            tenant: "tenant".into(),
            role: "owner".into(),
            mfa: Mfa::default(),
            iat: now,
            exp: now + exp_offset,
        })
    }

    fn device_claims() -> Claims {
        Claims::Device(DeviceClaims {
            uid: "fp".into(),
            tenant: "tenant".into(),
            iat: Utc::now().timestamp(),
        })
    }

    #[test]
    fn user_token_roundtrip() {
        let issuer = JwtIssuer::new(b"test-secret");
        let claims = user_claims(3600);
        let token = issuer.sign(&claims).unwrap();

        let decoded = issuer.verify_user_token(&token).unwrap();
        assert_eq!(Claims::User(decoded), claims);
        assert!(issuer.verify_device_token(&token).is_none());
    }

    #[test]
    fn device_token_roundtrip() {
        let issuer = JwtIssuer::new(b"test-secret");
        let token = issuer.sign(&device_claims()).unwrap();

        let decoded = issuer.verify_device_token(&token).unwrap();
        assert_eq!(decoded.uid, "fp");
        assert!(issuer.verify_user_token(&token).is_none());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = JwtIssuer::new(b"a").sign(&device_claims()).unwrap();
        assert!(JwtIssuer::new(b"b").verify_device_token(&token).is_none());
    }

    #[test]
    fn expired_user_token_is_rejected() {
        let issuer = JwtIssuer::new(b"s");
        let token = issuer.sign(&user_claims(-3600)).unwrap();
        assert!(issuer.verify_user_token(&token).is_none());
    }

    #[test]
    fn secret_is_persisted_and_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("jwt-secret");
        let first = load_or_create_secret(&path);
        assert_eq!(first.len(), 64);
        assert_eq!(load_or_create_secret(&path), first);
    }
}
