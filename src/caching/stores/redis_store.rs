//! # Redis Cache Store
//!
//! Redis-backed cache store built on the `redis` crate's `ConnectionManager`,
//! which reconnects transparently. Calls are not retried here; the
//! [`CacheManager`](crate::caching::CacheManager) bounds each one by a timeout.

use super::CacheStore;
use crate::caching::{CacheError, CacheResult};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Redis cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisCacheConfig {
    /// Redis connection URL
    pub url: String,

    /// Connection timeout
    #[serde(with = "humantime_serde")]
    pub connection_timeout: Duration,

    /// Prefix prepended to every key, for sharing one Redis between deployments
    pub key_prefix: String,

    /// Keys fetched per SCAN round trip during prefix listing
    pub scan_count: usize,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connection_timeout: Duration::from_secs(5),
            key_prefix: String::new(),
            scan_count: 1000,
        }
    }
}

/// Redis cache implementation
#[derive(Clone)]
pub struct RedisCache {
    config: RedisCacheConfig,
    connection: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis and verify the connection with a PING
    pub async fn new(config: RedisCacheConfig) -> CacheResult<Self> {
        let client = Client::open(config.url.as_str())?;

        let connection = tokio::time::timeout(config.connection_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Timeout {
                timeout_ms: config.connection_timeout.as_millis() as u64,
            })??;

        let cache = Self { config, connection };
        if !cache.health_check().await? {
            return Err(CacheError::Unavailable);
        }

        info!("Redis cache connected to {}", cache.config.url);
        Ok(cache)
    }

    /// Get the full cache key with prefix
    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }

    /// Strip the deployment prefix from a key returned by Redis
    fn logical_key(&self, full_key: String) -> String {
        match full_key.strip_prefix(&self.config.key_prefix) {
            Some(stripped) => stripped.to_string(),
            None => full_key,
        }
    }
}

/// Escape glob metacharacters so a literal prefix can be used in `SCAN MATCH`
pub fn escape_glob(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for ch in literal.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.connection.clone();
        let value: Option<Vec<u8>> = conn.get(self.full_key(key)).await?;

        debug!(
            "Redis cache {} for key: {}",
            if value.is_some() { "hit" } else { "miss" },
            key
        );
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        let mut conn = self.connection.clone();
        // SET EX rejects 0, sub-second TTLs round up
        let ttl_seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(self.full_key(key), value, ttl_seconds).await?;

        debug!("Set Redis cache key: {} with TTL: {:?}", key, ttl);
        Ok(())
    }

    async fn incr(&self, key: &str, ttl: Duration) -> CacheResult<i64> {
        let mut conn = self.connection.clone();
        let full_key = self.full_key(key);

        // SET NX EX seeds the counter with its TTL, so a counter never
        // exists without an expiry
        let (count,): (i64,) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&full_key)
            .arg(0)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .arg("NX")
            .ignore()
            .incr(&full_key, 1)
            .query_async(&mut conn)
            .await?;
        Ok(count)
    }

    async fn keys_with_prefix(&self, prefix: &str) -> CacheResult<Vec<String>> {
        let mut conn = self.connection.clone();
        let pattern = format!("{}*", escape_glob(&self.full_key(prefix)));

        let mut cursor: u64 = 0;
        let mut keys = Vec::new();
        loop {
            let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(self.config.scan_count)
                .query_async(&mut conn)
                .await?;

            keys.extend(batch.into_iter().map(|k| self.logical_key(k)));

            if next_cursor == 0 {
                break;
            }
            cursor = next_cursor;
        }

        Ok(keys)
    }

    async fn delete(&self, keys: &[String]) -> CacheResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connection.clone();
        let full_keys: Vec<String> = keys.iter().map(|k| self.full_key(k)).collect();
        let deleted: u64 = conn.del(&full_keys).await?;

        debug!("Deleted {} Redis cache keys", deleted);
        Ok(deleted)
    }

    async fn health_check(&self) -> CacheResult<bool> {
        let mut conn = self.connection.clone();
        let response: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(response == "PONG")
    }
}
