//! Account lockout after repeated failed logins.
//!
//! Attempts are counted per `(source, user_id)` pair. The first two failures
//! are free; from the third on, the pair is locked for `4^(a-3)` minutes,
//! capped at the configured ceiling. Both the counter and the lockout live
//! only in the cache and expire through their TTLs.
//!
//! The counter update is a read followed by a write. Two failures racing on
//! the same pair can both read the same count and under-count by one.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{Cache, CacheError, get_json, set_json};
use crate::clock::Clock;

/// Failures that never trigger a lockout.
pub const FREE_ATTEMPTS: u32 = 2;

/// Lockout and attempt counter for one `(source, user_id)` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockoutState {
    /// Unix timestamp until which logins are refused, or `0`.
    pub expiry: i64,
    pub attempts: u32,
}

impl LockoutState {
    pub fn is_locked(&self) -> bool {
        self.expiry != 0
    }
}

/// Durations derived from an attempt count, in whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutWindow {
    /// How long the pair stays locked.
    pub lockout_minutes: i64,
    /// How long the attempt counter is remembered.
    pub attempt_ttl_minutes: i64,
}

/// Windows for the `attempt`-th consecutive failure under a ceiling of
/// `max_minutes`. Fractions of a minute are truncated.
pub fn lockout_windows(attempt: u32, max_minutes: i64) -> LockoutWindow {
    let max = max_minutes as f64;
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX).saturating_sub(3);
    let raw = 4f64.powi(exponent).min(max);
    LockoutWindow {
        lockout_minutes: raw as i64,
        attempt_ttl_minutes: (raw * 2.5).min(max).max(2.0) as i64,
    }
}

pub struct LoginThrottle {
    cache: Arc<dyn Cache>,
    clock: Arc<dyn Clock>,
    max_lockout_minutes: i64,
}

impl LoginThrottle {
    pub fn new(cache: Arc<dyn Cache>, clock: Arc<dyn Clock>, max_lockout_minutes: i64) -> Self {
        Self {
            cache,
            clock,
            max_lockout_minutes,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_lockout_minutes > 0
    }

    /// Current lockout and attempt count, without changing either.
    pub async fn check(&self, source: &str, user_id: &str) -> Result<LockoutState, CacheError> {
        if !self.is_enabled() {
            return Ok(LockoutState::default());
        }

        let expiry: i64 = get_json(self.cache.as_ref(), &lockout_key(source, user_id))
            .await?
            .unwrap_or(0);
        let attempts: u32 = get_json(self.cache.as_ref(), &attempt_key(source, user_id))
            .await?
            .unwrap_or(0);

        // A backend that evicts lazily may still hand back a lapsed lockout.
        let expiry = if expiry > self.clock.now().timestamp() {
            expiry
        } else {
            0
        };

        Ok(LockoutState { expiry, attempts })
    }

    /// Count one more failure and lock the pair once the free attempts are spent.
    pub async fn record_failure(
        &self,
        source: &str,
        user_id: &str,
    ) -> Result<LockoutState, CacheError> {
        if !self.is_enabled() {
            return Ok(LockoutState::default());
        }

        let key = attempt_key(source, user_id);
        let previous: u32 = get_json(self.cache.as_ref(), &key).await?.unwrap_or(0);
        let attempts = previous.saturating_add(1);

        let window = lockout_windows(attempts, self.max_lockout_minutes);
        set_json(
            self.cache.as_ref(),
            &key,
            &attempts,
            minutes(window.attempt_ttl_minutes),
        )
        .await?;

        if attempts <= FREE_ATTEMPTS {
            debug!(source, user_id, attempts, "failed login recorded");
            return Ok(LockoutState {
                expiry: 0,
                attempts,
            });
        }

        let expiry = self
            .clock
            .now()
            .timestamp()
            .saturating_add(window.lockout_minutes.saturating_mul(60));
        set_json(
            self.cache.as_ref(),
            &lockout_key(source, user_id),
            &expiry,
            minutes(window.lockout_minutes),
        )
        .await?;

        debug!(
            source,
            user_id,
            attempts,
            lockout_minutes = window.lockout_minutes,
            "account locked"
        );
        Ok(LockoutState { expiry, attempts })
    }

    /// Forget all failures for the pair. Resetting a clean pair is a no-op.
    pub async fn reset(&self, source: &str, user_id: &str) -> Result<(), CacheError> {
        if !self.is_enabled() {
            return Ok(());
        }

        self.cache.delete(&attempt_key(source, user_id)).await?;
        self.cache.delete(&lockout_key(source, user_id)).await
    }
}

fn attempt_key(source: &str, user_id: &str) -> String {
    format!("login-attempt:{source}-{user_id}")
}

fn lockout_key(source: &str, user_id: &str) -> String {
    format!("account-lockout:{source}-{user_id}")
}

fn minutes(m: i64) -> Duration {
    Duration::from_secs(u64::try_from(m).unwrap_or(0).saturating_mul(60))
}
