//! Persistence seams used by the auth service.
//!
//! Lookups return `Ok(None)` when the record does not exist; `Err` is reserved
//! for backend failures.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::auth::User;
use crate::models::device::Device;
use crate::models::namespace::Namespace;

pub use memory::MemoryStore;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Duplicate record: {0}")]
    Duplicate(String),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Persist the full user record.
    async fn update_data(&self, id: &str, user: &User) -> Result<(), StoreError>;

    async fn update_password(&self, hash: &str, id: &str) -> Result<(), StoreError>;

    async fn get_mfa_status(&self, id: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait NamespaceStore: Send + Sync {
    async fn get(&self, tenant_id: &str) -> Result<Option<Namespace>, StoreError>;

    /// The first namespace `user_id` belongs to, if any.
    async fn get_first_for_user(&self, user_id: &str) -> Result<Option<Namespace>, StoreError>;
}

#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Register a device. Registering an existing fingerprint is not an error.
    async fn create(&self, device: &Device, hostname: &str) -> Result<(), StoreError>;

    async fn get_by_fingerprint(
        &self,
        fingerprint: &str,
        tenant_id: &str,
    ) -> Result<Option<Device>, StoreError>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Mark a session as active now.
    async fn set_last_seen(&self, uid: &str) -> Result<(), StoreError>;
}
