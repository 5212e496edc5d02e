//! Port abstraction for per-user setting persistence.
use async_trait::async_trait;

use crate::domain::{SystemUserId, SystemUserSetting};

use super::RepositoryError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserSettingRepository: Send + Sync {
    /// Insert or overwrite the setting identified by its owner and key.
    async fn upsert_setting(
        &self,
        setting: &SystemUserSetting,
    ) -> Result<SystemUserSetting, RepositoryError>;

    /// Remove a setting; `false` when it did not exist.
    async fn delete_setting(&self, id: i64) -> Result<bool, RepositoryError>;

    /// Fetch a setting by identifier.
    async fn find_setting(&self, id: i64) -> Result<Option<SystemUserSetting>, RepositoryError>;

    /// Every setting of one user.
    async fn settings_for_user(
        &self,
        user: &SystemUserId,
    ) -> Result<Vec<SystemUserSetting>, RepositoryError>;

    /// Fetch the setting stored under `key` for `user`.
    async fn find_setting_by_key(
        &self,
        user: &SystemUserId,
        key: &str,
    ) -> Result<Option<SystemUserSetting>, RepositoryError>;
}
