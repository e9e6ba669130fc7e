use std::sync::Arc;

use chrono::{DateTime, Utc};
use fleet_core::auth::fingerprint::device_fingerprint;
use fleet_core::auth::password;
use fleet_core::auth::service::{AuthBackends, AuthService};
use fleet_core::auth::throttle::{FREE_ATTEMPTS, lockout_windows};
use fleet_core::cache::MemoryCache;
use fleet_core::clock::{Clock, FixedClock};
use fleet_core::config::AuthConfig;
use fleet_core::models::auth::{User, UserAuthRequest};
use fleet_core::models::device::DeviceIdentity;
use fleet_core::store::MemoryStore;
use tracing::info;

use crate::Result;

const DRILL_USER: &str = "drill";
const DRILL_PASSWORD: &str = "drill-password";

pub fn lockout_schedule(max_minutes: i64, attempts: u32) {
    if max_minutes <= 0 {
        println!("throttling disabled");
        return;
    }
    println!("attempt\tlockout_min\tcounter_ttl_min");
    for a in 1..=attempts {
        let w = lockout_windows(a, max_minutes);
        let lockout = if a <= FREE_ATTEMPTS {
            0
        } else {
            w.lockout_minutes
        };
        println!("{a}\t{lockout}\t{}", w.attempt_ttl_minutes);
    }
}

pub fn hash_password(plain: &str) -> Result<()> {
    println!("{}", password::hash_password(plain)?);
    Ok(())
}

pub fn fingerprint(tenant: &str, mac: Option<String>, public_key: &str, hostname: &str) {
    let identity = mac.map(|mac| DeviceIdentity { mac });
    println!(
        "{}",
        device_fingerprint(hostname, identity.as_ref(), public_key, tenant)
    );
}

pub async fn drill(failures: u32, source: &str, max_minutes: i64) -> Result<()> {
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let store = Arc::new(MemoryStore::new(clock.clone()));
    let cache = Arc::new(MemoryCache::new(clock.clone()));

    let mut config = AuthConfig::with_secret("fleet-drill");
    config.max_lockout_minutes = max_minutes;

    store
        .insert_user(User {
            id: String::new(),
            username: DRILL_USER.into(),
            email: format!("{DRILL_USER}@fleet.local"),
            name: "Drill".into(),
            password_hash: password::hash_password(DRILL_PASSWORD)?,
            confirmed: true,
            last_login: clock.now(),
            mfa_enabled: false,
        })
        .await?;

    let service = AuthService::new(
        AuthBackends::in_memory(store, cache, clock, &config),
        &config,
    );
    info!(failures, source, max_minutes, "starting login drill");

    for n in 1..=failures {
        let req = UserAuthRequest {
            identifier: DRILL_USER.into(),
            password: "wrong".into(),
        };
        match service.authenticate_user(&req, source).await {
            Ok(_) => println!("attempt {n}: accepted"),
            Err(e) => println!("attempt {n}: {} {}", e.error, describe_lockout(e.lockout)),
        }
    }

    let req = UserAuthRequest {
        identifier: DRILL_USER.into(),
        password: DRILL_PASSWORD.into(),
    };
    match service.authenticate_user(&req, source).await {
        Ok(res) => println!("correct password: accepted ({})", serde_json::to_string(&res.mfa)?),
        Err(e) => println!("correct password: {} {}", e.error, describe_lockout(e.lockout)),
    }

    Ok(())
}

fn describe_lockout(expiry: i64) -> String {
    if expiry == 0 {
        return "(no lockout)".to_string();
    }
    match DateTime::<Utc>::from_timestamp(expiry, 0) {
        Some(t) => format!("(locked until {})", t.to_rfc3339()),
        None => format!("(locked until {expiry})"),
    }
}
