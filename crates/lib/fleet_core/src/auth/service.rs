//! Authentication service: device and user login flows.
//!
//! Every collaborator is injected through [`AuthBackends`]; the service keeps
//! no state of its own beyond those handles. Failures are returned to the
//! caller immediately and nothing is retried here.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use tracing::{debug, info, warn};

use super::fingerprint::device_fingerprint;
use super::jwt::{JwtIssuer, TokenIssuer};
use super::password::{BcryptHasher, PasswordHasher};
use super::throttle::LoginThrottle;
use super::{AuthError, LoginError};
use crate::cache::{Cache, set_json};
use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::models::auth::{
    Claims, DeviceClaims, Mfa, User, UserAuthRequest, UserAuthResponse, UserClaims,
};
use crate::models::device::{Device, DeviceAuthRequest, DeviceAuthResponse};
use crate::models::namespace::Namespace;
use crate::store::{DeviceStore, MemoryStore, NamespaceStore, SessionStore, UserStore};

/// Collaborators the service is built from.
#[derive(Clone)]
pub struct AuthBackends {
    pub users: Arc<dyn UserStore>,
    pub namespaces: Arc<dyn NamespaceStore>,
    pub devices: Arc<dyn DeviceStore>,
    pub sessions: Arc<dyn SessionStore>,
    /// Holds lockout state and issued tokens.
    pub cache: Arc<dyn Cache>,
    pub clock: Arc<dyn Clock>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub tokens: Arc<dyn TokenIssuer>,
}

impl AuthBackends {
    /// Wire every store seam to one [`MemoryStore`], with bcrypt hashing and
    /// HS256 tokens signed with the configured secret.
    pub fn in_memory(
        store: Arc<MemoryStore>,
        cache: Arc<dyn Cache>,
        clock: Arc<dyn Clock>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            users: store.clone(),
            namespaces: store.clone(),
            devices: store.clone(),
            sessions: store,
            cache,
            clock,
            hasher: Arc::new(BcryptHasher),
            tokens: Arc::new(JwtIssuer::new(config.jwt_secret.as_bytes())),
        }
    }
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    namespaces: Arc<dyn NamespaceStore>,
    devices: Arc<dyn DeviceStore>,
    sessions: Arc<dyn SessionStore>,
    cache: Arc<dyn Cache>,
    clock: Arc<dyn Clock>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
    throttle: LoginThrottle,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(backends: AuthBackends, config: &AuthConfig) -> Self {
        let throttle = LoginThrottle::new(
            backends.cache.clone(),
            backends.clock.clone(),
            config.max_lockout_minutes,
        );
        Self {
            users: backends.users,
            namespaces: backends.namespaces,
            devices: backends.devices,
            sessions: backends.sessions,
            cache: backends.cache,
            clock: backends.clock,
            hasher: backends.hasher,
            tokens: backends.tokens,
            throttle,
            token_ttl: config.token_ttl,
        }
    }

    pub fn throttle(&self) -> &LoginThrottle {
        &self.throttle
    }

    /// Register (or re-register) a device agent and issue it a token.
    ///
    /// Device logins are not throttled.
    pub async fn authenticate_device(
        &self,
        req: &DeviceAuthRequest,
        remote_addr: &str,
    ) -> Result<DeviceAuthResponse, AuthError> {
        let uid = device_fingerprint(
            &req.hostname,
            req.identity.as_ref(),
            &req.public_key,
            &req.tenant_id,
        );

        let device = Device {
            uid: uid.clone(),
            name: String::new(),
            identity: req.identity.clone(),
            public_key: req.public_key.clone(),
            tenant_id: req.tenant_id.clone(),
            last_seen: self.clock.now(),
            remote_addr: remote_addr.to_string(),
        };
        let hostname = req.hostname.to_lowercase();
        self.devices.create(&device, &hostname).await?;

        for session in &req.sessions {
            if let Err(e) = self.sessions.set_last_seen(session).await {
                warn!(session = %session, device = %uid, "could not refresh session: {e}");
            }
        }

        let device = self
            .devices
            .get_by_fingerprint(&uid, &req.tenant_id)
            .await?
            .ok_or_else(|| AuthError::DeviceNotFound(uid.clone()))?;

        let namespace = self
            .namespaces
            .get(&device.tenant_id)
            .await?
            .ok_or_else(|| AuthError::NamespaceNotFound(device.tenant_id.clone()))?;

        let token = self.tokens.sign(&Claims::Device(DeviceClaims {
            uid: uid.clone(),
            tenant: device.tenant_id.clone(),
            iat: self.clock.now().timestamp(),
        }))?;

        debug!(device = %uid, tenant = %device.tenant_id, "device authenticated");

        Ok(DeviceAuthResponse {
            uid,
            token,
            name: device.name,
            namespace: namespace.name,
            remote_addr: remote_addr.to_string(),
        })
    }

    /// Authenticate with username (or email) + password from `source`.
    ///
    /// Unknown identifiers, wrong passwords and active lockouts all fail with
    /// [`AuthError::Unauthorized`]; [`LoginError::lockout`] tells them apart
    /// for display only.
    pub async fn authenticate_user(
        &self,
        req: &UserAuthRequest,
        source: &str,
    ) -> Result<UserAuthResponse, LoginError> {
        let lookup = if is_email(&req.identifier) {
            self.users.get_by_email(&req.identifier).await
        } else {
            self.users.get_by_username(&req.identifier).await
        };

        let mut user = match lookup {
            Ok(Some(user)) => user,
            Ok(None) => return Err(AuthError::Unauthorized.into()),
            Err(e) => {
                warn!(identifier = %req.identifier, "user lookup failed: {e}");
                return Err(AuthError::Unauthorized.into());
            }
        };

        if !user.confirmed {
            return Err(AuthError::UserNotConfirmed.into());
        }

        // Lockout wins over the password check, even for a correct password.
        let state = self.throttle.check(source, &user.id).await?;
        if state.is_locked() {
            debug!(user_id = %user.id, source, lockout = state.expiry, "login refused: locked");
            return Err(LoginError::new(AuthError::Unauthorized, state.expiry));
        }

        if !self.hasher.compare(&req.password, &user.password_hash) {
            let state = self.throttle.record_failure(source, &user.id).await?;
            return Err(LoginError::new(AuthError::Unauthorized, state.expiry));
        }

        self.throttle.reset(source, &user.id).await?;

        let mfa_enabled = self.users.get_mfa_status(&user.id).await?;
        let namespace = self.first_namespace(&user.id).await;

        if self.hasher.needs_rehash(&user.password_hash) {
            self.migrate_password(&mut user, &req.password).await;
        }

        user.last_login = self.clock.now();
        if let Err(source) = self.users.update_data(&user.id, &user).await {
            return Err(AuthError::UserUpdate {
                user: Box::new(user),
                source,
            }
            .into());
        }

        let mfa = Mfa {
            enable: mfa_enabled,
            validate: false,
        };
        let res = self.issue(&user, namespace.as_ref(), mfa).await?;

        info!(user_id = %user.id, tenant = %res.tenant, "user authenticated");
        Ok(res)
    }

    /// Rebuild the auth response for an already-authenticated user, keeping
    /// the token they presented.
    pub async fn auth_user_info(
        &self,
        username: &str,
        tenant_id: &str,
        token: &str,
    ) -> Result<UserAuthResponse, AuthError> {
        let user = match self.users.get_by_username(username).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                return Err(AuthError::UserNotFound {
                    id: username.to_string(),
                    source: None,
                });
            }
            Err(e) => {
                return Err(AuthError::UserNotFound {
                    id: username.to_string(),
                    source: Some(e),
                });
            }
        };

        let (tenant, role) = if tenant_id.is_empty() {
            (String::new(), String::new())
        } else {
            let namespace = self
                .namespaces
                .get(tenant_id)
                .await?
                .ok_or_else(|| AuthError::NamespaceNotFound(tenant_id.to_string()))?;
            let role = namespace.role_of(&user.id).to_string();
            (namespace.tenant_id, role)
        };

        let mfa_enabled = self.users.get_mfa_status(&user.id).await?;

        Ok(UserAuthResponse {
            id: user.id,
            name: user.name,
            user: user.username,
            email: user.email,
            tenant,
            role,
            token: token.to_string(),
            mfa: Mfa {
                enable: mfa_enabled,
                validate: false,
            },
        })
    }

    /// Issue a fresh token for `user_id` without checking credentials.
    ///
    /// The token is scoped to the user's first namespace. With
    /// `uses_namespace` a user who belongs to none is refused with
    /// [`AuthError::NamespaceNotFound`]; otherwise an unscoped token is issued.
    pub async fn auth_get_token(
        &self,
        user_id: &str,
        uses_namespace: bool,
    ) -> Result<UserAuthResponse, AuthError> {
        let user = match self.users.get_by_id(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                return Err(AuthError::UserNotFound {
                    id: user_id.to_string(),
                    source: None,
                });
            }
            Err(e) => {
                return Err(AuthError::UserNotFound {
                    id: user_id.to_string(),
                    source: Some(e),
                });
            }
        };

        let namespace = self.first_namespace(&user.id).await;
        if uses_namespace && namespace.is_none() {
            return Err(AuthError::NamespaceNotFound(user.id));
        }

        let mfa_enabled = self.users.get_mfa_status(&user.id).await?;
        let mfa = Mfa {
            enable: mfa_enabled,
            validate: false,
        };

        self.issue(&user, namespace.as_ref(), mfa).await
    }

    /// A user without a namespace is valid; lookup failures are treated the
    /// same way.
    async fn first_namespace(&self, user_id: &str) -> Option<Namespace> {
        match self.namespaces.get_first_for_user(user_id).await {
            Ok(namespace) => namespace,
            Err(e) => {
                warn!(user_id, "namespace lookup failed: {e}");
                None
            }
        }
    }

    /// Replace a legacy hash with one from the current algorithm. The
    /// password has just been verified, so the plaintext is known good.
    async fn migrate_password(&self, user: &mut User, plain: &str) {
        let hash = match self.hasher.hash(plain) {
            Ok(hash) => hash,
            Err(e) => {
                warn!(user_id = %user.id, "could not rehash legacy password: {e}");
                return;
            }
        };
        match self.users.update_password(&hash, &user.id).await {
            Ok(()) => {
                info!(user_id = %user.id, "migrated legacy password hash");
                user.password_hash = hash;
            }
            Err(e) => warn!(user_id = %user.id, "could not persist migrated password: {e}"),
        }
    }

    /// Sign a user token and cache the response under the token key.
    async fn issue(
        &self,
        user: &User,
        namespace: Option<&Namespace>,
        mfa: Mfa,
    ) -> Result<UserAuthResponse, AuthError> {
        let (tenant, role) = match namespace {
            Some(ns) => (ns.tenant_id.clone(), ns.role_of(&user.id).to_string()),
            None => (String::new(), String::new()),
        };

        let now = self.clock.now();
        let ttl = chrono::Duration::from_std(self.token_ttl)
            .map_err(|e| AuthError::Token(format!("token ttl out of range: {e}")))?;
        let token = self.tokens.sign(&Claims::User(UserClaims {
            id: user.id.clone(),
            username: user.username.clone(),
            tenant: tenant.clone(),
            role: role.clone(),
            mfa,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }))?;

        let res = UserAuthResponse {
            id: user.id.clone(),
            name: user.name.clone(),
            user: user.username.clone(),
            email: user.email.clone(),
            tenant,
            role,
            token,
            mfa,
        };

        set_json(
            self.cache.as_ref(),
            &token_cache_key(&res.tenant, &res.id),
            &res,
            self.token_ttl,
        )
        .await?;

        Ok(res)
    }
}

/// Cache key of an issued user token.
pub fn token_cache_key(tenant: &str, user_id: &str) -> String {
    format!("token_{tenant}{user_id}")
}

/// Address shape used to route the identifier to the email lookup.
static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

fn is_email(identifier: &str) -> bool {
    EMAIL.as_ref().is_some_and(|re| re.is_match(identifier))
}
