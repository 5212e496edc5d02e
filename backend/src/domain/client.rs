//! Client data model.

use serde::{Deserialize, Serialize};

use super::permission::{PermissionSet, Resource};
use super::validation::{Guarded, Validate, check_text};

/// Maximum length of [`Client::short_title`].
pub const SHORT_TITLE_MAX: usize = 50;
/// Maximum length of [`Client::title`].
pub const TITLE_MAX: usize = 200;

/// Validation errors for [`Client`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ClientValidationError {
    #[error("short title is required")]
    MissingShortTitle,
    #[error("short title must be at most 50 characters")]
    ShortTitleTooLong,
    #[error("title is required")]
    MissingTitle,
    #[error("title must be at most 200 characters")]
    TitleTooLong,
}

/// Customer whose projects are tracked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Durable identifier; `None` until created.
    #[serde(default)]
    pub id: Option<i64>,
    pub short_title: String,
    pub title: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub is_active: bool,
}

impl Client {
    /// Lookup probe carrying only an identifier.
    pub fn with_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }
}

impl Validate for Client {
    type Error = ClientValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        self.validate_changes()
    }

    fn validate_changes(&self) -> Result<(), Self::Error> {
        check_text(
            &self.short_title,
            SHORT_TITLE_MAX,
            ClientValidationError::MissingShortTitle,
            ClientValidationError::ShortTitleTooLong,
        )?;
        check_text(
            &self.title,
            TITLE_MAX,
            ClientValidationError::MissingTitle,
            ClientValidationError::TitleTooLong,
        )
    }
}

impl Guarded for Client {
    const PERMISSIONS: PermissionSet = Resource::Clients.permissions();

    fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}
