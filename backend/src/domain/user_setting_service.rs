//! Per-user setting use cases.
//!
//! Permissions are settings, so every write here is followed by an
//! invalidation of the matching permission-cache entry.

use std::sync::Arc;

use tracing::debug;

use super::error::{OperationError, OperationResult};
use super::guards::positive_id;
use super::permission_cache::PermissionSource;
use super::ports::UserSettingRepository;
use super::rules::{Authorization, RuleChain, SettingIntegrity, Validation};
use super::session::RequestContext;
use super::system_user::SystemUserId;
use super::user_setting::SystemUserSetting;

const ENTITY: &str = "setting";

/// Write and query per-user settings.
pub struct UserSettingService<R> {
    settings: Arc<R>,
    permissions: Arc<dyn PermissionSource>,
    set_rules: RuleChain<SystemUserSetting>,
    delete_rules: RuleChain<SystemUserSetting>,
    read_rules: RuleChain<SystemUserSetting>,
}

impl<R> UserSettingService<R>
where
    R: UserSettingRepository,
{
    pub fn new(settings: Arc<R>, permissions: &Arc<dyn PermissionSource>) -> Self {
        Self {
            settings,
            permissions: Arc::clone(permissions),
            set_rules: RuleChain::new()
                .then(Validation::full())
                .then(Authorization::alter(Arc::clone(permissions)))
                .then(SettingIntegrity),
            delete_rules: RuleChain::new().then(Authorization::delete(Arc::clone(permissions))),
            read_rules: RuleChain::new().then(Authorization::view(Arc::clone(permissions))),
        }
    }

    /// Insert or overwrite the setting stored under its (user, key) pair.
    pub async fn set(
        &self,
        setting: SystemUserSetting,
        context: &RequestContext,
    ) -> OperationResult<SystemUserSetting> {
        if let Some(id) = setting.id {
            positive_id(id, ENTITY)?;
        }
        self.set_rules.run(&setting, context).await?;
        let stored = self
            .settings
            .upsert_setting(&setting)
            .await
            .map_err(OperationError::failure_with)?;
        if let Some(user) = stored.system_user_id.as_ref() {
            self.permissions.invalidate(user, &stored.key).await?;
        }
        debug!(id = ?stored.id, key = %stored.key, "setting stored");
        Ok(stored)
    }

    pub async fn get_by_id(
        &self,
        id: i64,
        context: &RequestContext,
    ) -> OperationResult<SystemUserSetting> {
        positive_id(id, ENTITY)?;
        self.read_rules
            .run(&SystemUserSetting::with_id(id), context)
            .await?;
        self.settings
            .find_setting(id)
            .await
            .map_err(OperationError::failure_with)?
            .ok_or_else(|| OperationError::not_found(ENTITY))
    }

    pub async fn get_by_user_id(
        &self,
        user: &SystemUserId,
        context: &RequestContext,
    ) -> OperationResult<Vec<SystemUserSetting>> {
        self.read_rules
            .run(&SystemUserSetting::default(), context)
            .await?;
        self.settings
            .settings_for_user(user)
            .await
            .map_err(OperationError::failure_with)
    }

    /// Value stored under `key` for `user`.
    pub async fn get_value(
        &self,
        user: &SystemUserId,
        key: &str,
        context: &RequestContext,
    ) -> OperationResult<String> {
        self.read_rules
            .run(&SystemUserSetting::default(), context)
            .await?;
        self.settings
            .find_setting_by_key(user, key)
            .await
            .map_err(OperationError::failure_with)?
            .map(|setting| setting.value)
            .ok_or_else(|| OperationError::not_found(ENTITY))
    }

    pub async fn delete(&self, id: i64, context: &RequestContext) -> OperationResult<()> {
        positive_id(id, ENTITY)?;
        self.delete_rules
            .run(&SystemUserSetting::with_id(id), context)
            .await?;
        let existing = self
            .settings
            .find_setting(id)
            .await
            .map_err(OperationError::failure_with)?
            .ok_or_else(|| OperationError::not_found(ENTITY))?;
        let removed = self
            .settings
            .delete_setting(id)
            .await
            .map_err(OperationError::failure_with)?;
        if !removed {
            return Err(OperationError::not_found(ENTITY));
        }
        if let Some(user) = existing.system_user_id.as_ref() {
            self.permissions.invalidate(user, &existing.key).await?;
        }
        Ok(())
    }
}
