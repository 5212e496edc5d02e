//! Cache store adapters.
//!
//! - [`RedisCacheStore`]: pooled Redis connection used in deployments.
//! - [`InMemoryCacheStore`]: process-local store with clock-driven expiry,
//!   used by tests and local runs.

mod memory;
mod redis_store;

pub use memory::InMemoryCacheStore;
pub use redis_store::{RedisCacheStore, RedisConfig};
