//! A cache that remembers nothing.

use std::time::Duration;

use async_trait::async_trait;

use super::{Cache, CacheError};

/// Every write is dropped and every read misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

#[async_trait]
impl Cache for NullCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_cache_never_returns_values() {
        let cache = NullCache;
        cache
            .set("k", "v".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        assert!(cache.get("k").await.unwrap().is_none());
        cache.delete("k").await.unwrap();
    }
}
