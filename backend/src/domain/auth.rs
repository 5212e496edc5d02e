//! Login request and response types.
//!
//! Inbound payloads are parsed here so the session flow only ever sees a
//! well-formed email and a non-empty password.

use std::fmt;

use serde::Serialize;
use zeroize::Zeroizing;

use super::system_user::{SystemUser, is_valid_email};

/// Message returned for every rejected login, whichever half failed.
pub const LOGIN_REJECTED_MESSAGE: &str = "email or password incorrect";

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Password was blank.
    EmptyPassword,
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Email is not a single well-formed address.
    InvalidEmail,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPassword => write!(f, "password is required"),
            Self::EmptyEmail => write!(f, "email is required"),
            Self::InvalidEmail => write!(f, "email is not valid"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials.
///
/// ## Invariants
/// - `email` is trimmed and well-formed.
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use lms_backend::domain::LoginRequest;
///
/// let request = LoginRequest::try_from_parts(" ada@example.com ", "secret").unwrap();
/// assert_eq!(request.email(), "ada@example.com");
/// assert_eq!(request.password(), "secret");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    email: String,
    password: Zeroizing<String>,
}

impl LoginRequest {
    /// Construct a request from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        let normalized = email.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }
        if !is_valid_email(normalized) {
            return Err(LoginValidationError::InvalidEmail);
        }

        Ok(Self {
            email: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Profile handed back after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub email: String,
    pub name: String,
    pub surname: String,
    pub token: String,
}

impl LoginResponse {
    pub(crate) fn for_user(user: &SystemUser, token: &str) -> Self {
        Self {
            email: user.email.clone(),
            name: user.name.clone(),
            surname: user.surname.clone(),
            token: token.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "", LoginValidationError::EmptyPassword)]
    #[case("ada@example.com", "", LoginValidationError::EmptyPassword)]
    #[case("   ", "pw", LoginValidationError::EmptyEmail)]
    #[case("ada", "pw", LoginValidationError::InvalidEmail)]
    fn invalid_requests(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginRequest::try_from_parts(email, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn password_whitespace_is_preserved() {
        let request = LoginRequest::try_from_parts("ada@example.com", " pw ")
            .expect("valid inputs should succeed");
        assert_eq!(request.password(), " pw ");
    }

    #[rstest]
    fn response_serialises_in_camel_case() {
        let user = SystemUser {
            name: "Ada".into(),
            surname: "Lovelace".into(),
            email: "ada@example.com".into(),
            ..SystemUser::default()
        };
        let value = serde_json::to_value(LoginResponse::for_user(&user, "tok"))
            .expect("serialises");
        assert_eq!(value["surname"], "Lovelace");
        assert_eq!(value["token"], "tok");
    }
}
