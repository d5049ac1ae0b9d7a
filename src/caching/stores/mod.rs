//! # Cache Stores Module
//!
//! The cache store collaborator and its implementations: Redis for
//! deployments, an in-memory map for tests and single-node runs.

pub mod memory;
pub mod redis_store;

pub use memory::InMemoryCache;
pub use redis_store::{RedisCache, RedisCacheConfig};

use super::CacheResult;
use async_trait::async_trait;
use std::time::Duration;

/// Trait for cache store implementations
///
/// Implementations must be safe for concurrent use. Counter increments must
/// not lose updates under concurrent callers.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a value from the cache. A missing key is `Ok(None)`.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Set a value in the cache with TTL
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()>;

    /// Increment an integer counter, creating it at 1 if absent.
    ///
    /// `ttl` is applied only when the counter is created.
    async fn incr(&self, key: &str, ttl: Duration) -> CacheResult<i64>;

    /// All live keys starting with `prefix`
    async fn keys_with_prefix(&self, prefix: &str) -> CacheResult<Vec<String>>;

    /// Delete the given keys, returning how many existed
    async fn delete(&self, keys: &[String]) -> CacheResult<u64>;

    /// Perform health check
    async fn health_check(&self) -> CacheResult<bool>;
}
