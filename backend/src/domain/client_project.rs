//! Client project data model.

use serde::{Deserialize, Serialize};

use super::permission::{PermissionSet, Resource};
use super::validation::{Guarded, Validate, check_text};

/// Maximum length of [`ClientProject::name`].
pub const NAME_MAX: usize = 100;

/// Validation errors for [`ClientProject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ClientProjectValidationError {
    #[error("client id is required")]
    MissingClient,
    #[error("name is required")]
    MissingName,
    #[error("name must be at most 100 characters")]
    NameTooLong,
}

/// Project run for a [`super::Client`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientProject {
    #[serde(default)]
    pub id: Option<i64>,
    /// Owning client; fixed once the project exists.
    pub client_id: i64,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
}

impl ClientProject {
    /// Lookup probe carrying only an identifier.
    pub fn with_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }
}

impl Validate for ClientProject {
    type Error = ClientProjectValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.client_id <= 0 {
            return Err(ClientProjectValidationError::MissingClient);
        }
        self.validate_changes()
    }

    fn validate_changes(&self) -> Result<(), Self::Error> {
        check_text(
            &self.name,
            NAME_MAX,
            ClientProjectValidationError::MissingName,
            ClientProjectValidationError::NameTooLong,
        )
    }
}

impl Guarded for ClientProject {
    const PERMISSIONS: PermissionSet = Resource::ClientProjects.permissions();

    fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}
