//! Devices, their hardware identity and the sessions opened through them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hardware identity reported by the device agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub mac: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Fingerprint derived from the device's identity fields.
    pub uid: String,
    pub name: String,
    pub identity: Option<DeviceIdentity>,
    pub public_key: String,
    pub tenant_id: String,
    pub last_seen: DateTime<Utc>,
    pub remote_addr: String,
}

/// Remote session opened through a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub uid: String,
    pub device_uid: String,
    pub last_seen: DateTime<Utc>,
}

/// Device agent login.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceAuthRequest {
    pub tenant_id: String,
    pub identity: Option<DeviceIdentity>,
    pub public_key: String,
    pub hostname: String,
    /// Sessions the agent is currently serving; their activity is refreshed.
    #[serde(default)]
    pub sessions: Vec<String>,
}

/// Result of a successful device authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAuthResponse {
    pub uid: String,
    pub token: String,
    pub name: String,
    pub namespace: String,
    pub remote_addr: String,
}
