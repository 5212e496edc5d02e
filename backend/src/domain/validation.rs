//! Shared entity validation contract.

use std::fmt;

use super::permission::PermissionSet;

/// Field-level validation for an entity.
pub trait Validate {
    /// Error describing the first violated constraint.
    type Error: fmt::Display;

    /// Every constraint, including those that only apply on creation.
    fn validate(&self) -> Result<(), Self::Error>;

    /// Constraints that still apply to an update of an existing record.
    fn validate_changes(&self) -> Result<(), Self::Error>;
}

/// Entity whose mutations are guarded by a [`PermissionSet`].
pub trait Guarded {
    /// Keys guarding the entity type.
    const PERMISSIONS: PermissionSet;

    /// Whether the entity already carries a durable identifier.
    fn is_persisted(&self) -> bool;
}

/// Check that a text field is present and at most `max` characters long.
pub(crate) fn check_text<E>(value: &str, max: usize, missing: E, too_long: E) -> Result<(), E> {
    if value.trim().is_empty() {
        return Err(missing);
    }
    check_length(value, max, too_long)
}

/// Check that a possibly empty text field is at most `max` characters long.
pub(crate) fn check_length<E>(value: &str, max: usize, too_long: E) -> Result<(), E> {
    if value.chars().count() > max {
        return Err(too_long);
    }
    Ok(())
}
