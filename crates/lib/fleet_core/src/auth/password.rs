//! Password hashing via bcrypt, with acceptance of legacy SHA-256 digests.

use sha2::{Digest, Sha256};

use super::AuthError;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 10;

const BCRYPT_PREFIXES: [&str; 4] = ["$2a$", "$2b$", "$2x$", "$2y$"];

pub trait PasswordHasher: Send + Sync {
    /// Whether `plain` matches the stored `hash`.
    fn compare(&self, plain: &str, hash: &str) -> bool;

    fn hash(&self, plain: &str) -> Result<String, AuthError>;

    /// Whether `hash` predates the current algorithm and should be replaced.
    fn needs_rehash(&self, hash: &str) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BcryptHasher;

impl PasswordHasher for BcryptHasher {
    fn compare(&self, plain: &str, hash: &str) -> bool {
        if is_bcrypt(hash) {
            return bcrypt::verify(plain, hash).unwrap_or(false);
        }
        legacy_digest(plain) == hash
    }

    fn hash(&self, plain: &str) -> Result<String, AuthError> {
        hash_password(plain)
    }

    fn needs_rehash(&self, hash: &str) -> bool {
        !is_bcrypt(hash)
    }
}

/// Hash a password with bcrypt (cost 10).
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST).map_err(|e| AuthError::Hash(format!("bcrypt hash: {e}")))
}

fn is_bcrypt(hash: &str) -> bool {
    BCRYPT_PREFIXES.iter().any(|p| hash.starts_with(p))
}

/// Hex SHA-256 of the password, the format accounts were stored in before bcrypt.
fn legacy_digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}
