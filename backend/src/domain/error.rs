//! Operation outcome types shared by every domain service.
//!
//! Services return [`OperationResult`]. The error side carries an
//! [`ErrorKind`] so adapters can tell business rule rejections apart from
//! missing authentication and from infrastructure faults.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Message shown in place of any infrastructure failure detail.
pub const GENERIC_FAILURE_MESSAGE: &str = "something went wrong";

/// Category of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A business rule or validation rejected the request.
    Logic,
    /// The caller is not authenticated.
    Auth,
    /// An infrastructure collaborator failed.
    Failure,
}

/// Error half of [`OperationResult`].
///
/// # Examples
/// ```
/// use lms_backend::domain::{ErrorKind, OperationError};
///
/// let err = OperationError::logic("title is required");
/// assert_eq!(err.kind(), ErrorKind::Logic);
/// assert_eq!(err.message(), "title is required");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct OperationError {
    kind: ErrorKind,
    message: String,
    details: Option<Value>,
}

/// Result of every domain operation.
pub type OperationResult<T> = Result<T, OperationError>;

impl OperationError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Business rule rejection.
    pub fn logic(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Logic, message)
    }

    /// Business rule rejection with structured details.
    pub fn logic_with_details(message: impl Into<String>, details: Value) -> Self {
        Self::logic(message).with_details(details)
    }

    /// Missing or invalid authentication.
    pub fn auth() -> Self {
        Self::new(ErrorKind::Auth, "authentication required")
    }

    /// Infrastructure failure without further context.
    pub fn failure() -> Self {
        Self::new(ErrorKind::Failure, "unexpected failure")
    }

    /// Infrastructure failure wrapping the collaborator's error.
    pub fn failure_with(error: impl fmt::Display) -> Self {
        Self::new(ErrorKind::Failure, error.to_string())
    }

    /// Authorization rejection naming the permission that was not granted.
    pub fn permission_denied(permission: &str) -> Self {
        Self::logic_with_details(
            format!("not authorised: {permission}"),
            json!({ "permission": permission }),
        )
    }

    /// Lookup of a record that does not exist.
    pub fn not_found(entity: &str) -> Self {
        Self::logic(format!("{entity} not found"))
    }

    /// Attach structured details to the error.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Category of the failure.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Full message, including infrastructure detail for failures.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Supplementary details.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Message safe to show to the caller.
    pub fn public_message(&self) -> &str {
        match self.kind {
            ErrorKind::Failure => GENERIC_FAILURE_MESSAGE,
            ErrorKind::Logic | ErrorKind::Auth => &self.message,
        }
    }

    /// Whether this is a business rule rejection.
    pub fn is_logic(&self) -> bool {
        self.kind == ErrorKind::Logic
    }

    /// Whether this is an authentication failure.
    pub fn is_auth(&self) -> bool {
        self.kind == ErrorKind::Auth
    }

    /// Whether this is an infrastructure failure.
    pub fn is_failure(&self) -> bool {
        self.kind == ErrorKind::Failure
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for OperationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn failure_hides_detail_from_public_message() {
        let err = OperationError::failure_with("connection refused");
        assert_eq!(err.message(), "connection refused");
        assert_eq!(err.public_message(), GENERIC_FAILURE_MESSAGE);
        assert!(err.is_failure());
    }

    #[rstest]
    #[case(OperationError::logic("bad"), "bad")]
    #[case(OperationError::auth(), "authentication required")]
    fn non_failures_expose_their_message(#[case] err: OperationError, #[case] expected: &str) {
        assert_eq!(err.public_message(), expected);
    }

    #[rstest]
    fn permission_denied_names_the_key() {
        let err = OperationError::permission_denied("clients.add");
        assert!(err.is_logic());
        assert_eq!(
            err.details(),
            Some(&json!({ "permission": "clients.add" }))
        );
    }

    #[rstest]
    fn display_includes_kind() {
        assert_eq!(OperationError::auth().to_string(), "Auth: authentication required");
    }
}
