//! Errors shared by the durable store repositories.
use thiserror::Error;

/// Persistence errors raised by repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// Store connection could not be established.
    #[error("repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("repository query failed: {message}")]
    Query { message: String },
}

impl RepositoryError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RepositoryError::connection("refused"), "repository connection failed: refused")]
    #[case(RepositoryError::query(String::from("duplicate key")), "repository query failed: duplicate key")]
    fn messages_name_the_failure(#[case] err: RepositoryError, #[case] expected: &str) {
        assert_eq!(err.to_string(), expected);
    }
}
