//! Key/value cache with per-entry TTL.
//!
//! Shared by the login throttle (attempt counters, lockout expiries) and the
//! token cache. Values travel as JSON strings; [`get_json`] and [`set_json`]
//! do the typed conversion.

pub mod memory;
pub mod null;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use memory::MemoryCache;
pub use null::NullCache;

/// Cache errors.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait Cache: Send + Sync {
    /// Fetch a value. A missing or expired key is `Ok(None)`, not an error.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a value that expires after `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Remove a value. Removing a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Fetch and decode a JSON value.
pub async fn get_json<T: DeserializeOwned>(
    cache: &dyn Cache,
    key: &str,
) -> Result<Option<T>, CacheError> {
    match cache.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode a value as JSON and store it.
pub async fn set_json<T: Serialize + ?Sized>(
    cache: &dyn Cache,
    key: &str,
    value: &T,
    ttl: Duration,
) -> Result<(), CacheError> {
    let raw = serde_json::to_string(value)?;
    cache.set(key, raw, ttl).await
}
