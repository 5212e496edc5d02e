//! Runtime configuration loaded via OrthoConfig.
//!
//! Values come from `LMS_*` environment variables, CLI flags or a
//! configuration file; anything left unset falls back to a default.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::SessionPolicy;
use crate::outbound::cache::RedisConfig;

const DEFAULT_REDIS_ADDRESS: &str = "redis://127.0.0.1:6379";
const DEFAULT_REDIS_POOL_SIZE: u32 = 16;
const DEFAULT_REDIS_CONNECT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_SESSION_TTL_HOURS: u64 = 5;
const MAX_SESSION_TTL_HOURS: u64 = 720;

/// Settings for the cache connection and session lifetime.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LMS")]
pub struct LmsSettings {
    /// Redis connection URL.
    pub redis_address: Option<String>,
    /// Maximum pooled Redis connections.
    pub redis_pool_size: Option<u32>,
    /// Seconds to wait for a pooled connection.
    pub redis_connect_timeout_secs: Option<u64>,
    /// Session lifetime in hours.
    pub session_ttl_hours: Option<u64>,
}

impl LmsSettings {
    pub fn redis_address(&self) -> &str {
        self.redis_address
            .as_deref()
            .unwrap_or(DEFAULT_REDIS_ADDRESS)
    }

    pub fn redis_pool_size(&self) -> u32 {
        self.redis_pool_size
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_REDIS_POOL_SIZE)
    }

    pub fn redis_connect_timeout(&self) -> Duration {
        Duration::from_secs(
            self.redis_connect_timeout_secs
                .unwrap_or(DEFAULT_REDIS_CONNECT_TIMEOUT_SECS),
        )
    }

    /// Session lifetime in hours, clamped to `1..=720`.
    pub fn session_ttl_hours(&self) -> u64 {
        self.session_ttl_hours
            .unwrap_or(DEFAULT_SESSION_TTL_HOURS)
            .clamp(1, MAX_SESSION_TTL_HOURS)
    }

    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy::new(Duration::from_secs(self.session_ttl_hours() * 60 * 60))
    }

    pub fn redis_config(&self) -> RedisConfig {
        RedisConfig::new(self.redis_address())
            .with_max_size(self.redis_pool_size())
            .with_connection_timeout(self.redis_connect_timeout())
    }
}
