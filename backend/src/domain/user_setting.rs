//! Per-user setting data model. Permissions are stored as settings.

use serde::{Deserialize, Serialize};

use super::permission::{PermissionSet, Resource};
use super::system_user::SystemUserId;
use super::validation::{Guarded, Validate, check_length, check_text};

/// Maximum length of [`SystemUserSetting::key`].
pub const KEY_MAX: usize = 50;
/// Maximum length of [`SystemUserSetting::value`].
pub const VALUE_MAX: usize = 200;
/// Maximum length of [`SystemUserSetting::description`].
pub const DESCRIPTION_MAX: usize = 200;

/// Validation errors for [`SystemUserSetting`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UserSettingValidationError {
    #[error("system user id is required")]
    MissingSystemUser,
    #[error("key is required")]
    MissingKey,
    #[error("key must be at most 50 characters")]
    KeyTooLong,
    #[error("value is required")]
    MissingValue,
    #[error("value must be at most 200 characters")]
    ValueTooLong,
    #[error("description must be at most 200 characters")]
    DescriptionTooLong,
}

/// Key/value setting owned by a system user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemUserSetting {
    #[serde(default)]
    pub id: Option<i64>,
    pub system_user_id: Option<SystemUserId>,
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub description: String,
}

impl SystemUserSetting {
    /// Setting for `user` with the given key and value.
    pub fn new(
        user: SystemUserId,
        key: impl Into<String>,
        value: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            system_user_id: Some(user),
            key: key.into(),
            value: value.into(),
            description: description.into(),
        }
    }

    /// Lookup probe carrying only an identifier.
    pub fn with_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }
}

impl Validate for SystemUserSetting {
    type Error = UserSettingValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.system_user_id.is_none() {
            return Err(UserSettingValidationError::MissingSystemUser);
        }
        check_text(
            &self.key,
            KEY_MAX,
            UserSettingValidationError::MissingKey,
            UserSettingValidationError::KeyTooLong,
        )?;
        check_text(
            &self.value,
            VALUE_MAX,
            UserSettingValidationError::MissingValue,
            UserSettingValidationError::ValueTooLong,
        )?;
        check_length(
            &self.description,
            DESCRIPTION_MAX,
            UserSettingValidationError::DescriptionTooLong,
        )
    }

    fn validate_changes(&self) -> Result<(), Self::Error> {
        self.validate()
    }
}

impl Guarded for SystemUserSetting {
    const PERMISSIONS: PermissionSet = Resource::SystemSettings.permissions();

    fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "1", UserSettingValidationError::MissingKey)]
    #[case(&"k".repeat(51), "1", UserSettingValidationError::KeyTooLong)]
    #[case("clients.view", "", UserSettingValidationError::MissingValue)]
    #[case("clients.view", &"v".repeat(201), UserSettingValidationError::ValueTooLong)]
    fn rejects_invalid_settings(
        #[case] key: &str,
        #[case] value: &str,
        #[case] expected: UserSettingValidationError,
    ) {
        let setting = SystemUserSetting::new(SystemUserId::random(), key, value, "");
        assert_eq!(setting.validate(), Err(expected));
    }

    #[rstest]
    fn requires_an_owner() {
        let setting = SystemUserSetting {
            key: "clients.view".into(),
            value: "1".into(),
            ..SystemUserSetting::default()
        };
        assert_eq!(
            setting.validate(),
            Err(UserSettingValidationError::MissingSystemUser)
        );
    }
}
