//! Read-through cache of per-user permission values.
//!
//! Cached grants live in the hash `sus:<userId>`, one field per permission
//! key, without expiry. Writes to a permission setting invalidate the
//! matching field. Concurrent misses for the same (user, key) pair are
//! coalesced so only one durable lookup runs; the others re-read the cache
//! once the first has populated it.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::credential_cache::CredentialCache;
use super::error::{OperationError, OperationResult};
use super::permission::GRANTED;
use super::ports::{CacheStore, UserSettingRepository};
use super::session::RequestContext;
use super::system_user::SystemUserId;

const PERMISSION_PREFIX: &str = "sus:";

/// Cache key of the permission hash for `user`.
pub fn permission_hash_key(user: &SystemUserId) -> String {
    format!("{PERMISSION_PREFIX}{user}")
}

/// Value stored for a permission key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionValue {
    /// A setting exists with this value.
    Present(String),
    /// No setting exists for the key.
    Missing,
}

impl PermissionValue {
    /// A granted permission.
    pub fn granted() -> Self {
        Self::Present(GRANTED.to_owned())
    }

    /// Whether the value grants access.
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Present(value) if value == GRANTED)
    }
}

/// Resolves permission values for the caller of a request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionSource: Send + Sync {
    /// Value of `key` for the user owning the request's session.
    ///
    /// Requests without a live session fail with an authentication error.
    async fn permission(
        &self,
        context: &RequestContext,
        key: &str,
    ) -> OperationResult<PermissionValue>;

    /// Forget any cached value of `key` for `user`.
    ///
    /// Every write to a permission setting must call this afterwards.
    async fn invalidate(&self, user: &SystemUserId, key: &str) -> OperationResult<()>;
}

type SlotKey = (SystemUserId, String);

/// Permission cache over a [`CacheStore`] backed by the settings repository.
pub struct PermissionCache<C, S> {
    store: Arc<C>,
    credentials: Arc<CredentialCache<C>>,
    settings: Arc<S>,
    in_flight: DashMap<SlotKey, Arc<Mutex<()>>>,
}

impl<C, S> PermissionCache<C, S>
where
    C: CacheStore,
    S: UserSettingRepository,
{
    pub fn new(store: Arc<C>, credentials: Arc<CredentialCache<C>>, settings: Arc<S>) -> Self {
        Self {
            store,
            credentials,
            settings,
            in_flight: DashMap::new(),
        }
    }

    /// Value of `key` for `user`, reading through to the settings store.
    pub async fn permission_for(
        &self,
        user: &SystemUserId,
        key: &str,
    ) -> OperationResult<PermissionValue> {
        let hash_key = permission_hash_key(user);
        if let Some(value) = self.cached(&hash_key, key).await? {
            debug!(permission = key, "permission cache hit");
            return Ok(PermissionValue::Present(value));
        }

        let (slot_key, slot) = self.claim_slot(user, key);
        let outcome = {
            let _guard = slot.lock().await;
            self.load_after_miss(user, &hash_key, key).await
        };
        self.release_slot(&slot_key, slot);
        outcome
    }

    /// Drop the cached value of `key` for `user`.
    ///
    /// Waits for any in-flight lookup of the same pair so a value read
    /// before a durable write cannot be cached after it.
    pub async fn invalidate_for(&self, user: &SystemUserId, key: &str) -> OperationResult<()> {
        let (slot_key, slot) = self.claim_slot(user, key);
        let outcome = {
            let _guard = slot.lock().await;
            self.store
                .delete_hash_field(&permission_hash_key(user), key)
                .await
                .map_err(OperationError::failure_with)
        };
        self.release_slot(&slot_key, slot);
        debug!(user = %user, permission = key, "permission invalidated");
        outcome
    }

    fn claim_slot(&self, user: &SystemUserId, key: &str) -> (SlotKey, Arc<Mutex<()>>) {
        let slot_key = (user.clone(), key.to_owned());
        let entry = self.in_flight.entry(slot_key.clone()).or_default();
        let slot = Arc::clone(entry.value());
        drop(entry);
        (slot_key, slot)
    }

    fn release_slot(&self, slot_key: &SlotKey, slot: Arc<Mutex<()>>) {
        drop(slot);
        self.in_flight
            .remove_if(slot_key, |_, slot| Arc::strong_count(slot) == 1);
    }

    async fn cached(&self, hash_key: &str, key: &str) -> OperationResult<Option<String>> {
        self.store
            .get_hash_field(hash_key, key)
            .await
            .map_err(OperationError::failure_with)
    }

    async fn load_after_miss(
        &self,
        user: &SystemUserId,
        hash_key: &str,
        key: &str,
    ) -> OperationResult<PermissionValue> {
        if let Some(value) = self.cached(hash_key, key).await? {
            debug!(permission = key, "permission populated by concurrent lookup");
            return Ok(PermissionValue::Present(value));
        }

        debug!(permission = key, "permission cache miss");
        let setting = self
            .settings
            .find_setting_by_key(user, key)
            .await
            .map_err(OperationError::failure_with)?;
        let Some(setting) = setting else {
            return Ok(PermissionValue::Missing);
        };

        if let Err(err) = self
            .store
            .set_hash_field(hash_key, key, &setting.value)
            .await
        {
            warn!(permission = key, error = %err, "failed to cache permission");
        }
        Ok(PermissionValue::Present(setting.value))
    }
}

#[async_trait]
impl<C, S> PermissionSource for PermissionCache<C, S>
where
    C: CacheStore,
    S: UserSettingRepository,
{
    async fn permission(
        &self,
        context: &RequestContext,
        key: &str,
    ) -> OperationResult<PermissionValue> {
        let token = context.token().ok_or_else(OperationError::auth)?;
        let credential = self
            .credentials
            .credential(token)
            .await?
            .ok_or_else(OperationError::auth)?;
        self.permission_for(&credential.user_id, key).await
    }

    async fn invalidate(&self, user: &SystemUserId, key: &str) -> OperationResult<()> {
        self.invalidate_for(user, key).await
    }
}
