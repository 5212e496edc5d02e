//! Session tokens, cached credentials and the per-request context.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::system_user::{SystemUser, SystemUserId};

/// Lifetime of cached credentials when no policy is configured.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(5 * 60 * 60);

/// Opaque bearer token issued at login.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionToken(String);

/// Validation errors for [`SessionToken`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionTokenError {
    /// The token was empty or whitespace.
    #[error("session token must not be empty")]
    Empty,
    /// The token carried surrounding whitespace.
    #[error("session token must not contain surrounding whitespace")]
    Padded,
}

impl SessionToken {
    /// Validate and wrap a raw token.
    pub fn new(raw: impl Into<String>) -> Result<Self, SessionTokenError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(SessionTokenError::Empty);
        }
        if raw.trim() != raw {
            return Err(SessionTokenError::Padded);
        }
        Ok(Self(raw))
    }

    /// Mint a fresh random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<SessionToken> for String {
    fn from(value: SessionToken) -> Self {
        value.0
    }
}

impl TryFrom<String> for SessionToken {
    type Error = SessionTokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Identity snapshot cached against a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Owner of the session.
    pub user_id: SystemUserId,
    /// Given name.
    pub name: String,
    /// Family name.
    pub surname: String,
    /// Login email.
    pub email: String,
}

const FIELD_ID: &str = "id";
const FIELD_NAME: &str = "n";
const FIELD_SURNAME: &str = "sn";
const FIELD_EMAIL: &str = "e";

/// Failure to rebuild a [`Credential`] from cached fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialDecodeError {
    /// A required field was absent.
    #[error("cached credential is missing field '{field}'")]
    MissingField {
        /// Cache field name.
        field: &'static str,
    },
    /// The stored user id was not a UUID.
    #[error("cached credential has an invalid user id")]
    InvalidUserId,
}

impl Credential {
    /// Snapshot the identity fields of `user`.
    ///
    /// Returns `None` for users that have not been persisted yet.
    pub fn for_user(user: &SystemUser) -> Option<Self> {
        Some(Self {
            user_id: user.id.clone()?,
            name: user.name.clone(),
            surname: user.surname.clone(),
            email: user.email.clone(),
        })
    }

    /// Field/value pairs stored in the credential hash.
    pub fn to_fields(&self) -> Vec<(String, String)> {
        vec![
            (FIELD_ID.to_owned(), self.user_id.to_string()),
            (FIELD_NAME.to_owned(), self.name.clone()),
            (FIELD_SURNAME.to_owned(), self.surname.clone()),
            (FIELD_EMAIL.to_owned(), self.email.clone()),
        ]
    }

    /// Rebuild a credential from the cached hash.
    pub fn from_fields(
        mut fields: HashMap<String, String>,
    ) -> Result<Self, CredentialDecodeError> {
        let mut take = |field: &'static str| {
            fields
                .remove(field)
                .ok_or(CredentialDecodeError::MissingField { field })
        };
        let user_id =
            SystemUserId::new(take(FIELD_ID)?).map_err(|_| CredentialDecodeError::InvalidUserId)?;
        Ok(Self {
            user_id,
            name: take(FIELD_NAME)?,
            surname: take(FIELD_SURNAME)?,
            email: take(FIELD_EMAIL)?,
        })
    }
}

/// Expiry applied to cached credentials and their reverse index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    ttl: Duration,
}

impl SessionPolicy {
    /// Policy with an explicit lifetime.
    pub const fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// Lifetime of a session.
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

/// Per-request ambient state handed to every service call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    token: Option<SessionToken>,
}

impl RequestContext {
    /// Context for a request that presented `token`.
    pub fn authenticated(token: SessionToken) -> Self {
        Self { token: Some(token) }
    }

    /// Context for a request without a session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Session token presented by the caller.
    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", SessionTokenError::Empty)]
    #[case("   ", SessionTokenError::Empty)]
    #[case(" abc", SessionTokenError::Padded)]
    fn rejects_bad_tokens(#[case] raw: &str, #[case] expected: SessionTokenError) {
        assert_eq!(SessionToken::new(raw), Err(expected));
    }

    #[rstest]
    fn generated_tokens_are_distinct() {
        assert_ne!(SessionToken::generate(), SessionToken::generate());
    }

    #[rstest]
    fn credential_decode_reports_missing_field() {
        let credential = Credential {
            user_id: SystemUserId::random(),
            name: "Ada".into(),
            surname: "Lovelace".into(),
            email: "ada@example.com".into(),
        };
        let mut fields: HashMap<_, _> = credential.to_fields().into_iter().collect();
        fields.remove("sn");
        assert_eq!(
            Credential::from_fields(fields),
            Err(CredentialDecodeError::MissingField { field: "sn" })
        );
    }

    #[rstest]
    fn credential_decode_rejects_garbage_id() {
        let fields = HashMap::from([
            ("id".to_owned(), "not-a-uuid".to_owned()),
            ("n".to_owned(), "Ada".to_owned()),
            ("sn".to_owned(), "Lovelace".to_owned()),
            ("e".to_owned(), "ada@example.com".to_owned()),
        ]);
        assert_eq!(
            Credential::from_fields(fields),
            Err(CredentialDecodeError::InvalidUserId)
        );
    }

    #[rstest]
    fn default_policy_lasts_five_hours() {
        assert_eq!(SessionPolicy::default().ttl(), Duration::from_secs(18_000));
    }
}
