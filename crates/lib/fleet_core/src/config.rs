//! Auth configuration.

use std::time::Duration;

use crate::auth::jwt::resolve_jwt_secret;

/// Default lockout ceiling in minutes (about 15 days).
pub const DEFAULT_MAX_LOCKOUT_MINUTES: i64 = 32768;

/// Lifetime of issued user tokens and their cache entries: 72 hours.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(72 * 60 * 60);

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Longest lockout a single source can earn, in minutes. `<= 0` disables
    /// login throttling entirely.
    pub max_lockout_minutes: i64,
    /// Lifetime of user tokens.
    pub token_ttl: Duration,
    /// JWT signing secret.
    pub jwt_secret: String,
}

impl AuthConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                      | Default                        |
    /// |-------------------------------|--------------------------------|
    /// | `API_MAXIMUM_ACCOUNT_LOCKOUT` | `32768`                        |
    /// | `JWT_SECRET`                  | generated & persisted to file  |
    pub fn from_env() -> Self {
        Self {
            max_lockout_minutes: parse_max_lockout(
                std::env::var("API_MAXIMUM_ACCOUNT_LOCKOUT").ok().as_deref(),
            ),
            token_ttl: DEFAULT_TOKEN_TTL,
            jwt_secret: resolve_jwt_secret(),
        }
    }

    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            max_lockout_minutes: DEFAULT_MAX_LOCKOUT_MINUTES,
            token_ttl: DEFAULT_TOKEN_TTL,
            jwt_secret: jwt_secret.into(),
        }
    }
}

/// Unset or unparsable values fall back to the default.
fn parse_max_lockout(raw: Option<&str>) -> i64 {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.parse().unwrap_or_else(|_| {
            tracing::warn!(value = s, "invalid API_MAXIMUM_ACCOUNT_LOCKOUT, using default");
            DEFAULT_MAX_LOCKOUT_MINUTES
        }),
        None => DEFAULT_MAX_LOCKOUT_MINUTES,
    }
}
