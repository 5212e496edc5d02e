//! Integrity rule for per-user settings.

use async_trait::async_trait;

use super::Rule;
use crate::domain::error::{OperationError, OperationResult};
use crate::domain::session::RequestContext;
use crate::domain::user_setting::SystemUserSetting;

/// Requires a non-blank key and value before a setting is written.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettingIntegrity;

#[async_trait]
impl Rule<SystemUserSetting> for SettingIntegrity {
    async fn check(
        &self,
        setting: &SystemUserSetting,
        _context: &RequestContext,
    ) -> OperationResult<()> {
        if setting.key.trim().is_empty() || setting.value.trim().is_empty() {
            return Err(OperationError::logic("setting key and value are required"));
        }
        Ok(())
    }
}
