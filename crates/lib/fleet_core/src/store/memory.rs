//! In-memory implementation of every store trait.
//!
//! Backs the CLI drill and the test suites. All maps sit behind
//! `tokio::sync::RwLock`, so a single `Arc<MemoryStore>` can be handed to the
//! service as user, namespace, device and session store at once.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DeviceStore, NamespaceStore, SessionStore, StoreError, UserStore};
use crate::clock::Clock;
use crate::ids::new_user_id;
use crate::models::auth::User;
use crate::models::device::{Device, Session};
use crate::models::namespace::Namespace;

pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    namespaces: RwLock<Vec<Namespace>>,
    devices: RwLock<HashMap<String, Device>>,
    sessions: RwLock<HashMap<String, Session>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            namespaces: RwLock::new(Vec::new()),
            devices: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Insert a user. An empty `id` is replaced with a fresh UUIDv7.
    /// Returns the stored ID.
    pub async fn insert_user(&self, mut user: User) -> Result<String, StoreError> {
        if user.id.is_empty() {
            user.id = new_user_id();
        }
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(StoreError::Duplicate(user.username));
        }
        let id = user.id.clone();
        users.insert(id.clone(), user);
        Ok(id)
    }

    pub async fn insert_namespace(&self, namespace: Namespace) -> Result<(), StoreError> {
        let mut namespaces = self.namespaces.write().await;
        if namespaces.iter().any(|n| n.tenant_id == namespace.tenant_id) {
            return Err(StoreError::Duplicate(namespace.tenant_id));
        }
        namespaces.push(namespace);
        Ok(())
    }

    pub async fn insert_session(&self, session: Session) {
        self.sessions
            .write()
            .await
            .insert(session.uid.clone(), session);
    }

    pub async fn session(&self, uid: &str) -> Option<Session> {
        self.sessions.read().await.get(uid).cloned()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn update_data(&self, id: &str, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        match users.get_mut(id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(StoreError::Backend(format!("user {id} does not exist"))),
        }
    }

    async fn update_password(&self, hash: &str, id: &str) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        match users.get_mut(id) {
            Some(existing) => {
                existing.password_hash = hash.to_string();
                Ok(())
            }
            None => Err(StoreError::Backend(format!("user {id} does not exist"))),
        }
    }

    async fn get_mfa_status(&self, id: &str) -> Result<bool, StoreError> {
        let users = self.users.read().await;
        users
            .get(id)
            .map(|u| u.mfa_enabled)
            .ok_or_else(|| StoreError::Backend(format!("user {id} does not exist")))
    }
}

#[async_trait]
impl NamespaceStore for MemoryStore {
    async fn get(&self, tenant_id: &str) -> Result<Option<Namespace>, StoreError> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces.iter().find(|n| n.tenant_id == tenant_id).cloned())
    }

    async fn get_first_for_user(&self, user_id: &str) -> Result<Option<Namespace>, StoreError> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces
            .iter()
            .find(|n| n.members.iter().any(|m| m.id == user_id))
            .cloned())
    }
}

#[async_trait]
impl DeviceStore for MemoryStore {
    async fn create(&self, device: &Device, hostname: &str) -> Result<(), StoreError> {
        let mut devices = self.devices.write().await;
        if let Some(existing) = devices.get_mut(&device.uid) {
            existing.last_seen = device.last_seen;
            existing.remote_addr = device.remote_addr.clone();
            return Ok(());
        }

        let name = if hostname.is_empty() {
            device
                .identity
                .as_ref()
                .map(|i| i.mac.replace(':', "-"))
                .unwrap_or_default()
        } else {
            hostname.to_lowercase()
        };
        let mut device = device.clone();
        device.name = name;
        devices.insert(device.uid.clone(), device);
        Ok(())
    }

    async fn get_by_fingerprint(
        &self,
        fingerprint: &str,
        tenant_id: &str,
    ) -> Result<Option<Device>, StoreError> {
        let devices = self.devices.read().await;
        Ok(devices
            .get(fingerprint)
            .filter(|d| d.tenant_id == tenant_id)
            .cloned())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn set_last_seen(&self, uid: &str) -> Result<(), StoreError> {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(uid) {
            Some(session) => {
                session.last_seen = now;
                Ok(())
            }
            None => Err(StoreError::Backend(format!("session {uid} does not exist"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::device::DeviceIdentity;
    use crate::models::namespace::Member;
    use chrono::{TimeZone, Utc};

    fn store() -> (Arc<FixedClock>, MemoryStore) {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 3, 27, 3, 38, 9).unwrap(),
        ));
        (clock.clone(), MemoryStore::new(clock))
    }

    fn user(username: &str, email: &str) -> User {
        User {
            id: String::new(),
            username: username.into(),
            email: email.into(),
            name: "John Doe".into(),
            password_hash: String::new(),
            confirmed: true,
            last_login: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            mfa_enabled: false,
        }
    }

    fn device(uid: &str) -> Device {
        Device {
            uid: uid.into(),
            name: String::new(),
            identity: Some(DeviceIdentity {
                mac: "aa:bb:cc:dd:ee:ff".into(),
            }),
            public_key: String::new(),
            tenant_id: "tenant".into(),
            last_seen: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            remote_addr: "10.0.0.1".into(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_id_and_rejects_duplicates() {
        let (_, store) = store();
        let id = store
            .insert_user(user("john_doe", "john.doe@test.com"))
            .await
            .unwrap();
        assert!(crate::ids::is_user_id(&id));

        let err = store
            .insert_user(user("john_doe", "other@test.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn lookups_by_username_email_and_id() {
        let (_, store) = store();
        let id = store
            .insert_user(user("john_doe", "john.doe@test.com"))
            .await
            .unwrap();

        assert_eq!(
            store.get_by_username("john_doe").await.unwrap().unwrap().id,
            id
        );
        assert_eq!(
            store
                .get_by_email("John.Doe@test.com")
                .await
                .unwrap()
                .unwrap()
                .id,
            id
        );
        assert!(store.get_by_id(&id).await.unwrap().is_some());
        assert!(store.get_by_username("jane").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_password_replaces_hash() {
        let (_, store) = store();
        let id = store
            .insert_user(user("john_doe", "john.doe@test.com"))
            .await
            .unwrap();
        store.update_password("$2b$10$new", &id).await.unwrap();
        let stored = store.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "$2b$10$new");

        assert!(store.update_password("x", "missing").await.is_err());
    }

    #[tokio::test]
    async fn first_namespace_for_member() {
        let (_, store) = store();
        store
            .insert_namespace(Namespace {
                name: "group1".into(),
                owner: "u1".into(),
                tenant_id: "tenant".into(),
                members: vec![Member {
                    id: "u1".into(),
                    role: "owner".into(),
                }],
            })
            .await
            .unwrap();

        let ns = store.get_first_for_user("u1").await.unwrap().unwrap();
        assert_eq!(ns.tenant_id, "tenant");
        assert!(store.get_first_for_user("u2").await.unwrap().is_none());
        assert!(NamespaceStore::get(&store, "tenant").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn device_create_is_idempotent() {
        let (_, store) = store();
        store.create(&device("fp"), "Edge-01").await.unwrap();
        let first = store
            .get_by_fingerprint("fp", "tenant")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.name, "edge-01");

        let mut again = device("fp");
        again.remote_addr = "10.0.0.2".into();
        store.create(&again, "renamed").await.unwrap();
        let second = store
            .get_by_fingerprint("fp", "tenant")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.name, "edge-01");
        assert_eq!(second.remote_addr, "10.0.0.2");
    }

    #[tokio::test]
    async fn device_without_hostname_is_named_after_mac() {
        let (_, store) = store();
        store.create(&device("fp"), "").await.unwrap();
        let stored = store
            .get_by_fingerprint("fp", "tenant")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.name, "aa-bb-cc-dd-ee-ff");
    }

    #[tokio::test]
    async fn device_lookup_is_tenant_scoped() {
        let (_, store) = store();
        store.create(&device("fp"), "edge").await.unwrap();
        assert!(store.get_by_fingerprint("fp", "other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_last_seen_uses_clock() {
        let (clock, store) = store();
        store
            .insert_session(Session {
                uid: "s1".into(),
                device_uid: "fp".into(),
                last_seen: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            })
            .await;
        clock.advance(chrono::Duration::minutes(3));
        store.set_last_seen("s1").await.unwrap();
        assert_eq!(store.session("s1").await.unwrap().last_seen, clock.now());

        assert!(store.set_last_seen("missing").await.is_err());
    }
}
