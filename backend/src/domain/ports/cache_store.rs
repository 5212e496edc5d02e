//! Port abstraction for the key/value cache backing sessions and permissions.
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use thiserror::Error;

/// Errors raised by cache store adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheStoreError {
    /// The cache could not be reached.
    #[error("cache unavailable: {message}")]
    Unavailable { message: String },
    /// The cache rejected or failed a command.
    #[error("cache command failed: {message}")]
    Backend { message: String },
}

impl CacheStoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// One write applied as part of a [`CacheBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheCommand {
    /// Set several fields of a hash.
    SetHashFields {
        key: String,
        fields: Vec<(String, String)>,
    },
    /// Set a plain string value, optionally with an expiry.
    SetString {
        key: String,
        value: String,
        ttl: Option<Duration>,
    },
    /// Set the expiry of an existing key.
    Expire { key: String, ttl: Duration },
    /// Prepend a value to a list.
    ListPush { key: String, value: String },
    /// Remove every occurrence of a value from a list.
    ListRemove { key: String, value: String },
    /// Remove a key of any type.
    Delete { key: String },
}

/// Ordered writes applied atomically by [`CacheStore::execute`].
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use lms_backend::domain::ports::CacheBatch;
///
/// let batch = CacheBatch::new()
///     .list_push("su:rev:42", "token")
///     .expire("su:rev:42", Duration::from_secs(60));
/// assert_eq!(batch.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheBatch {
    commands: Vec<CacheCommand>,
}

impl CacheBatch {
    /// Empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw command.
    #[must_use]
    pub fn push(mut self, command: CacheCommand) -> Self {
        self.commands.push(command);
        self
    }

    /// Set several hash fields.
    #[must_use]
    pub fn set_hash_fields(self, key: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        self.push(CacheCommand::SetHashFields {
            key: key.into(),
            fields,
        })
    }

    /// Set a string value.
    #[must_use]
    pub fn set_string(
        self,
        key: impl Into<String>,
        value: impl Into<String>,
        ttl: Option<Duration>,
    ) -> Self {
        self.push(CacheCommand::SetString {
            key: key.into(),
            value: value.into(),
            ttl,
        })
    }

    /// Set an expiry.
    #[must_use]
    pub fn expire(self, key: impl Into<String>, ttl: Duration) -> Self {
        self.push(CacheCommand::Expire {
            key: key.into(),
            ttl,
        })
    }

    /// Prepend to a list.
    #[must_use]
    pub fn list_push(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(CacheCommand::ListPush {
            key: key.into(),
            value: value.into(),
        })
    }

    /// Drop every occurrence of `value` from a list.
    #[must_use]
    pub fn list_remove(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(CacheCommand::ListRemove {
            key: key.into(),
            value: value.into(),
        })
    }

    /// Delete a key.
    #[must_use]
    pub fn delete(self, key: impl Into<String>) -> Self {
        self.push(CacheCommand::Delete { key: key.into() })
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the batch holds no commands.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Queued commands in order.
    pub fn commands(&self) -> &[CacheCommand] {
        &self.commands
    }

    /// Consume the batch, yielding its commands in order.
    pub fn into_commands(self) -> Vec<CacheCommand> {
        self.commands
    }
}

/// Key/value cache with strings, hashes and lists.
///
/// Missing keys read as `None`, an empty map or an empty list rather than
/// as errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Whether `key` exists.
    async fn exists(&self, key: &str) -> Result<bool, CacheStoreError>;

    /// Read a string value.
    async fn get_string(&self, key: &str) -> Result<Option<String>, CacheStoreError>;

    /// Write a string value, optionally expiring after `ttl`.
    async fn set_string(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), CacheStoreError>;

    /// Read every field of a hash.
    async fn get_hash(&self, key: &str) -> Result<HashMap<String, String>, CacheStoreError>;

    /// Read one field of a hash.
    async fn get_hash_field(
        &self,
        key: &str,
        field: &str,
    ) -> Result<Option<String>, CacheStoreError>;

    /// Write one field of a hash without touching its expiry.
    async fn set_hash_field(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<(), CacheStoreError>;

    /// Remove one field of a hash.
    async fn delete_hash_field(&self, key: &str, field: &str) -> Result<(), CacheStoreError>;

    /// Remove a key of any type.
    async fn delete(&self, key: &str) -> Result<(), CacheStoreError>;

    /// Every element of a list, head first.
    async fn list_range(&self, key: &str) -> Result<Vec<String>, CacheStoreError>;

    /// Apply `batch` atomically.
    async fn execute(&self, batch: CacheBatch) -> Result<(), CacheStoreError>;
}
