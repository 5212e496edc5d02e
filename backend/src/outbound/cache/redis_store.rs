//! Redis-backed [`CacheStore`] over a `bb8` connection pool.
//!
//! Batches run inside `MULTI`/`EXEC` so a credential, its reverse index and
//! their expiries become visible together or not at all.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::{Pool, PooledConnection, RunError};
use bb8_redis::redis::{self, Cmd, RedisError};
use tracing::debug;

use crate::domain::ports::{CacheBatch, CacheCommand, CacheStore, CacheStoreError};

/// Configuration for the Redis connection pool.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use lms_backend::outbound::cache::RedisConfig;
///
/// let config = RedisConfig::new("redis://127.0.0.1:6379")
///     .with_max_size(8)
///     .with_connection_timeout(Duration::from_secs(2));
/// assert_eq!(config.address(), "redis://127.0.0.1:6379");
/// ```
#[derive(Debug, Clone)]
pub struct RedisConfig {
    address: String,
    max_size: u32,
    connection_timeout: Duration,
}

impl RedisConfig {
    /// Configuration with a pool of 16 connections and a 5 second checkout
    /// timeout.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            max_size: 16,
            connection_timeout: Duration::from_secs(5),
        }
    }

    #[must_use]
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    #[must_use]
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

fn backend(err: RedisError) -> CacheStoreError {
    CacheStoreError::backend(err.to_string())
}

fn checkout(err: RunError<RedisError>) -> CacheStoreError {
    CacheStoreError::unavailable(err.to_string())
}

/// Whole seconds of `ttl`, never less than one so a key cannot be written
/// already expired.
fn seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

fn command_for(command: &CacheCommand) -> Cmd {
    match command {
        CacheCommand::SetHashFields { key, fields } => {
            let mut cmd = redis::cmd("HSET");
            cmd.arg(key);
            for (field, value) in fields {
                cmd.arg(field).arg(value);
            }
            cmd
        }
        CacheCommand::SetString { key, value, ttl } => {
            let mut cmd = redis::cmd("SET");
            cmd.arg(key).arg(value);
            if let Some(ttl) = ttl {
                cmd.arg("EX").arg(seconds(*ttl));
            }
            cmd
        }
        CacheCommand::Expire { key, ttl } => {
            let mut cmd = redis::cmd("EXPIRE");
            cmd.arg(key).arg(seconds(*ttl));
            cmd
        }
        CacheCommand::ListPush { key, value } => {
            let mut cmd = redis::cmd("LPUSH");
            cmd.arg(key).arg(value);
            cmd
        }
        CacheCommand::ListRemove { key, value } => {
            let mut cmd = redis::cmd("LREM");
            cmd.arg(key).arg(0).arg(value);
            cmd
        }
        CacheCommand::Delete { key } => {
            let mut cmd = redis::cmd("DEL");
            cmd.arg(key);
            cmd
        }
    }
}

/// Cache store speaking to a Redis server.
#[derive(Clone)]
pub struct RedisCacheStore {
    pool: Pool<RedisConnectionManager>,
}

impl RedisCacheStore {
    /// Build the pool described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheStoreError::Unavailable`] when the address is invalid
    /// or the server cannot be reached.
    pub async fn connect(config: RedisConfig) -> Result<Self, CacheStoreError> {
        let manager = RedisConnectionManager::new(config.address.as_str())
            .map_err(|err| CacheStoreError::unavailable(err.to_string()))?;
        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|err| CacheStoreError::unavailable(err.to_string()))?;
        debug!(address = %config.address, "redis pool ready");
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: Pool<RedisConnectionManager>) -> Self {
        Self { pool }
    }

    async fn connection(
        &self,
    ) -> Result<PooledConnection<'_, RedisConnectionManager>, CacheStoreError> {
        self.pool.get().await.map_err(checkout)
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn exists(&self, key: &str) -> Result<bool, CacheStoreError> {
        let mut conn = self.connection().await?;
        let found: bool = redis::cmd("EXISTS")
            .arg(key)
            .query_async(&mut *conn)
            .await
            .map_err(backend)?;
        Ok(found)
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut *conn)
            .await
            .map_err(backend)?;
        Ok(value)
    }

    async fn set_string(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), CacheStoreError> {
        let command = CacheCommand::SetString {
            key: key.to_owned(),
            value: value.to_owned(),
            ttl,
        };
        let mut conn = self.connection().await?;
        let (): () = command_for(&command)
            .query_async(&mut *conn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn get_hash(&self, key: &str) -> Result<HashMap<String, String>, CacheStoreError> {
        let mut conn = self.connection().await?;
        let fields: HashMap<String, String> = redis::cmd("HGETALL")
            .arg(key)
            .query_async(&mut *conn)
            .await
            .map_err(backend)?;
        Ok(fields)
    }

    async fn get_hash_field(
        &self,
        key: &str,
        field: &str,
    ) -> Result<Option<String>, CacheStoreError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = redis::cmd("HGET")
            .arg(key)
            .arg(field)
            .query_async(&mut *conn)
            .await
            .map_err(backend)?;
        Ok(value)
    }

    async fn set_hash_field(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<(), CacheStoreError> {
        let mut conn = self.connection().await?;
        let (): () = redis::cmd("HSET")
            .arg(key)
            .arg(field)
            .arg(value)
            .query_async(&mut *conn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn delete_hash_field(&self, key: &str, field: &str) -> Result<(), CacheStoreError> {
        let mut conn = self.connection().await?;
        let (): () = redis::cmd("HDEL")
            .arg(key)
            .arg(field)
            .query_async(&mut *conn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheStoreError> {
        let mut conn = self.connection().await?;
        let (): () = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut *conn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn list_range(&self, key: &str) -> Result<Vec<String>, CacheStoreError> {
        let mut conn = self.connection().await?;
        let items: Vec<String> = redis::cmd("LRANGE")
            .arg(key)
            .arg(0)
            .arg(-1)
            .query_async(&mut *conn)
            .await
            .map_err(backend)?;
        Ok(items)
    }

    async fn execute(&self, batch: CacheBatch) -> Result<(), CacheStoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut pipe = redis::pipe();
        pipe.atomic();
        for command in batch.commands() {
            pipe.add_command(command_for(command)).ignore();
        }
        let mut conn = self.connection().await?;
        let (): () = pipe.query_async(&mut *conn).await.map_err(backend)?;
        debug!(commands = batch.len(), "redis batch committed");
        Ok(())
    }
}
