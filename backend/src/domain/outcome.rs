//! Transport envelope derived from an [`OperationResult`].

use serde::Serialize;
use serde_json::Value;
use tracing::error;

use super::error::{ErrorKind, OperationResult};

/// Serialisable view of an operation result.
///
/// Infrastructure failures are logged in full and exposed only as the
/// generic failure message.
///
/// # Examples
/// ```
/// use lms_backend::domain::{OperationError, Outcome};
///
/// let outcome: Outcome<()> = Err(OperationError::failure_with("redis down")).into();
/// assert!(!outcome.is_success());
/// assert_eq!(outcome.message(), Some("something went wrong"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl<T> Outcome<T> {
    /// Whether the operation succeeded.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Failure category, absent on success.
    pub fn kind(&self) -> Option<ErrorKind> {
        self.kind
    }

    /// Success payload.
    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    /// Caller-facing failure message.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Caller-facing failure details.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }
}

impl<T> From<OperationResult<T>> for Outcome<T> {
    fn from(result: OperationResult<T>) -> Self {
        match result {
            Ok(payload) => Self {
                success: true,
                kind: None,
                payload: Some(payload),
                message: None,
                details: None,
            },
            Err(err) => {
                let details = if err.is_failure() {
                    error!(error = %err.message(), "operation failed on infrastructure");
                    None
                } else {
                    err.details().cloned()
                };
                Self {
                    success: false,
                    kind: Some(err.kind()),
                    payload: None,
                    message: Some(err.public_message().to_owned()),
                    details,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OperationError;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn success_serialises_payload_only() {
        let outcome: Outcome<u32> = Ok(7).into();
        let value = serde_json::to_value(&outcome).expect("serialise");
        assert_eq!(value, json!({ "success": true, "payload": 7 }));
    }

    #[rstest]
    fn logic_errors_keep_details() {
        let outcome: Outcome<()> =
            Err(OperationError::permission_denied("timings.delete")).into();
        assert_eq!(outcome.kind(), Some(ErrorKind::Logic));
        assert_eq!(outcome.message(), Some("not authorised: timings.delete"));
        assert_eq!(
            outcome.details(),
            Some(&json!({ "permission": "timings.delete" }))
        );
    }

    #[rstest]
    fn failures_drop_details() {
        let err = OperationError::failure_with("pool exhausted")
            .with_details(json!({ "host": "cache-1" }));
        let outcome: Outcome<()> = Err(err).into();
        assert_eq!(outcome.kind(), Some(ErrorKind::Failure));
        assert!(outcome.details().is_none());
        assert_eq!(outcome.message(), Some("something went wrong"));
    }
}
