//! In-process cache with TTL-based expiration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{Cache, CacheError};
use crate::clock::Clock;

/// A cached entry with expiry.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// In-memory cache. Expiry is judged against the injected clock, so a
/// [`FixedClock`](crate::clock::FixedClock) makes TTLs deterministic.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of live (non-expired) entries.
    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| now < e.expires_at)
            .count()
    }

    #[cfg(test)]
    pub(crate) async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = self.clock.now();
        Ok(self.entries.read().await.get(key).and_then(|entry| {
            if now < entry.expires_at {
                Some(entry.value.clone())
            } else {
                None
            }
        }))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let now = self.clock.now();
        // TTLs past the representable range never expire.
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut entries = self.entries.write().await;
        entries.retain(|_, e| now < e.expires_at);
        entries.insert(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{get_json, set_json};
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    fn cache() -> (Arc<FixedClock>, MemoryCache) {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 3, 27, 3, 38, 9).unwrap(),
        ));
        let cache = MemoryCache::new(clock.clone());
        (clock, cache)
    }

    #[tokio::test]
    async fn get_returns_none_for_missing_key() {
        let (_, cache) = cache();
        assert!(cache.get("unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_and_get() {
        let (_, cache) = cache();
        cache
            .set("k1", "val1".into(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("k1").await.unwrap(), Some("val1".to_string()));
    }

    #[tokio::test]
    async fn entry_expires_after_ttl() {
        let (clock, cache) = cache();
        cache
            .set("k1", "val1".into(), Duration::from_secs(120))
            .await
            .unwrap();

        clock.advance(chrono::Duration::seconds(119));
        assert!(cache.get("k1").await.unwrap().is_some());

        clock.advance(chrono::Duration::seconds(1));
        assert!(cache.get("k1").await.unwrap().is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn set_overwrites_and_refreshes_ttl() {
        let (clock, cache) = cache();
        cache
            .set("k1", "a".into(), Duration::from_secs(60))
            .await
            .unwrap();
        clock.advance(chrono::Duration::seconds(50));
        cache
            .set("k1", "b".into(), Duration::from_secs(60))
            .await
            .unwrap();
        clock.advance(chrono::Duration::seconds(50));
        assert_eq!(cache.get("k1").await.unwrap(), Some("b".to_string()));
    }

    #[tokio::test]
    async fn delete_missing_key_is_ok() {
        let (_, cache) = cache();
        cache.delete("nothing").await.unwrap();
        cache.delete("nothing").await.unwrap();
    }

    #[tokio::test]
    async fn set_sweeps_expired_entries() {
        let (clock, cache) = cache();
        cache
            .set("short", "1".into(), Duration::from_secs(10))
            .await
            .unwrap();
        cache
            .set("long", "2".into(), Duration::from_secs(1000))
            .await
            .unwrap();
        clock.advance(chrono::Duration::seconds(11));
        cache
            .set("fresh", "3".into(), Duration::from_secs(10))
            .await
            .unwrap();

        let entries = cache.entries.read().await;
        assert!(!entries.contains_key("short"));
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn unrepresentable_ttl_never_expires() {
        let (clock, cache) = cache();
        cache
            .set("k", "v".into(), Duration::from_secs(u64::MAX))
            .await
            .unwrap();
        clock.advance(chrono::Duration::days(365 * 1000));
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn json_helpers() {
        let (_, cache) = cache();
        set_json(&cache, "n", &42i64, Duration::from_secs(60))
            .await
            .unwrap();
        let n: Option<i64> = get_json(&cache, "n").await.unwrap();
        assert_eq!(n, Some(42));

        let missing: Option<i64> = get_json(&cache, "other").await.unwrap();
        assert!(missing.is_none());

        cache
            .set("bad", "not json".into(), Duration::from_secs(60))
            .await
            .unwrap();
        let err = get_json::<i64>(&cache, "bad").await.unwrap_err();
        assert!(matches!(err, CacheError::Serialization(_)));
    }
}
