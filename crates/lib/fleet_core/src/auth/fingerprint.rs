//! Device fingerprints.
//!
//! A fingerprint is the hex SHA-256 of a canonical JSON encoding of the
//! device's identity fields. Field order is fixed by the struct below, so
//! equal inputs always produce the same fingerprint.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::models::device::DeviceIdentity;

#[derive(Serialize)]
struct FingerprintInput<'a> {
    hostname: &'a str,
    identity: Option<&'a DeviceIdentity>,
    public_key: &'a str,
    tenant_id: &'a str,
}

/// Compute the durable unique ID of a device.
pub fn device_fingerprint(
    hostname: &str,
    identity: Option<&DeviceIdentity>,
    public_key: &str,
    tenant_id: &str,
) -> String {
    let input = FingerprintInput {
        hostname,
        identity,
        public_key,
        tenant_id,
    };
    // Serializing borrowed strings and an optional struct cannot fail.
    let encoded = serde_json::to_vec(&input).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&encoded);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac(m: &str) -> DeviceIdentity {
        DeviceIdentity { mac: m.into() }
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let a = device_fingerprint("edge", Some(&mac("aa")), "key", "tenant");
        let b = device_fingerprint("edge", Some(&mac("aa")), "key", "tenant");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn every_field_contributes() {
        let base = device_fingerprint("edge", Some(&mac("aa")), "key", "tenant");
        assert_ne!(base, device_fingerprint("edge2", Some(&mac("aa")), "key", "tenant"));
        assert_ne!(base, device_fingerprint("edge", Some(&mac("bb")), "key", "tenant"));
        assert_ne!(base, device_fingerprint("edge", None, "key", "tenant"));
        assert_ne!(base, device_fingerprint("edge", Some(&mac("aa")), "key2", "tenant"));
        assert_ne!(base, device_fingerprint("edge", Some(&mac("aa")), "key", "other"));
    }

    #[test]
    fn fields_do_not_bleed_into_each_other() {
        assert_ne!(
            device_fingerprint("ab", None, "c", "t"),
            device_fingerprint("a", None, "bc", "t")
        );
    }
}
