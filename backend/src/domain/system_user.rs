//! System user data model.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroizing;

use super::permission::{PermissionSet, Resource};
use super::validation::{Guarded, Validate, check_text};

/// Maximum length of a user's name and surname.
pub const NAME_MAX: usize = 50;
/// Maximum length of an email address.
pub const EMAIL_MAX: usize = 255;
/// Maximum length of a stored password digest.
pub const PASSWORD_DIGEST_MAX: usize = 64;
/// Maximum length of a password salt.
pub const PASSWORD_SALT_MAX: usize = 15;

/// Validation errors for system users and their identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemUserValidationError {
    InvalidId,
    NilId,
    MissingName,
    NameTooLong,
    MissingSurname,
    SurnameTooLong,
    MissingEmail,
    EmailTooLong,
    InvalidEmail,
    MissingPassword,
    PasswordTooLong,
    MissingPasswordSalt,
    PasswordSaltTooLong,
}

impl fmt::Display for SystemUserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::NilId => write!(f, "user id must not be the nil UUID"),
            Self::MissingName => write!(f, "name is required"),
            Self::NameTooLong => write!(f, "name must be at most {NAME_MAX} characters"),
            Self::MissingSurname => write!(f, "surname is required"),
            Self::SurnameTooLong => {
                write!(f, "surname must be at most {NAME_MAX} characters")
            }
            Self::MissingEmail => write!(f, "email is required"),
            Self::EmailTooLong => write!(f, "email must be at most {EMAIL_MAX} characters"),
            Self::InvalidEmail => write!(f, "email must be a valid address"),
            Self::MissingPassword => write!(f, "password is required"),
            Self::PasswordTooLong => write!(
                f,
                "password digest must be at most {PASSWORD_DIGEST_MAX} characters"
            ),
            Self::MissingPasswordSalt => write!(f, "password salt is required"),
            Self::PasswordSaltTooLong => write!(
                f,
                "password salt must be at most {PASSWORD_SALT_MAX} characters"
            ),
        }
    }
}

impl std::error::Error for SystemUserValidationError {}

/// Stable system user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SystemUserId(Uuid, String);

impl SystemUserId {
    /// Validate and construct a [`SystemUserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, SystemUserValidationError> {
        let raw = id.as_ref();
        if raw.trim() != raw {
            return Err(SystemUserValidationError::InvalidId);
        }
        let parsed = Uuid::parse_str(raw).map_err(|_| SystemUserValidationError::InvalidId)?;
        Self::from_uuid(parsed)
    }

    /// Wrap an existing UUID, rejecting the nil value.
    pub fn from_uuid(uuid: Uuid) -> Result<Self, SystemUserValidationError> {
        if uuid.is_nil() {
            return Err(SystemUserValidationError::NilId);
        }
        Ok(Self(uuid, uuid.to_string()))
    }

    /// Generate a new random [`SystemUserId`].
    pub fn random() -> Self {
        let uuid = Uuid::new_v4();
        Self(uuid, uuid.to_string())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for SystemUserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for SystemUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<SystemUserId> for String {
    fn from(value: SystemUserId) -> Self {
        let SystemUserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for SystemUserId {
    type Error = SystemUserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Single addr-spec: local part, one @, dotted domain without spaces.
        let pattern = r"^[^\s@<>()\[\],;:]+@[^\s@<>()\[\],;:]+\.[^\s@<>()\[\],;:.]+$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Whether `email` is a single well-formed address.
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Stored system user record.
///
/// `password` holds the salted digest, never the plain secret.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemUser {
    pub id: Option<SystemUserId>,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
    pub password_salt: String,
    pub is_active: bool,
}

impl SystemUser {
    /// Lookup probe carrying only an identifier.
    pub fn with_id(id: SystemUserId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Public view without credential material.
    pub fn profile(&self) -> Option<SystemUserProfile> {
        Some(SystemUserProfile {
            id: self.id.clone()?,
            name: self.name.clone(),
            surname: self.surname.clone(),
            email: self.email.clone(),
            is_active: self.is_active,
        })
    }
}

impl Validate for SystemUser {
    type Error = SystemUserValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        self.validate_changes()?;
        check_text(
            &self.password,
            PASSWORD_DIGEST_MAX,
            SystemUserValidationError::MissingPassword,
            SystemUserValidationError::PasswordTooLong,
        )?;
        check_text(
            &self.password_salt,
            PASSWORD_SALT_MAX,
            SystemUserValidationError::MissingPasswordSalt,
            SystemUserValidationError::PasswordSaltTooLong,
        )
    }

    fn validate_changes(&self) -> Result<(), Self::Error> {
        check_text(
            &self.name,
            NAME_MAX,
            SystemUserValidationError::MissingName,
            SystemUserValidationError::NameTooLong,
        )?;
        check_text(
            &self.surname,
            NAME_MAX,
            SystemUserValidationError::MissingSurname,
            SystemUserValidationError::SurnameTooLong,
        )?;
        check_text(
            &self.email,
            EMAIL_MAX,
            SystemUserValidationError::MissingEmail,
            SystemUserValidationError::EmailTooLong,
        )?;
        if !is_valid_email(&self.email) {
            return Err(SystemUserValidationError::InvalidEmail);
        }
        Ok(())
    }
}

impl Guarded for SystemUser {
    const PERMISSIONS: PermissionSet = Resource::SystemUsers.permissions();

    fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// System user as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemUserProfile {
    pub id: SystemUserId,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub is_active: bool,
}

/// Input for creating a system user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSystemUser {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password: Zeroizing<String>,
    pub is_active: bool,
}

/// Input for updating a system user.
///
/// A `None` password keeps the stored digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemUserChanges {
    pub id: SystemUserId,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password: Option<Zeroizing<String>>,
    pub is_active: bool,
}
