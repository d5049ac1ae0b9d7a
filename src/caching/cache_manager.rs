//! # Cache Manager
//!
//! Wraps the injected cache store so that every call is bounded by the
//! configured per-call timeout and by the caller's [`OperationContext`].
//! Also keeps hit/miss counters for the health endpoint.

use super::{CacheResult, CacheStore};
use crate::core::context::OperationContext;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Cached listings discarded because an entry had ended
    pub stale: u64,
    /// Failed cache reads that were treated as misses
    pub read_errors: u64,
    pub write_errors: u64,
    pub invalidations: u64,
}

#[derive(Debug, Default)]
struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    stale: AtomicU64,
    read_errors: AtomicU64,
    write_errors: AtomicU64,
    invalidations: AtomicU64,
}

/// Timeout-bounded access to a cache store
pub struct CacheManager {
    store: Arc<dyn CacheStore>,
    operation_timeout: Duration,
    stats: StatsCounters,
}

impl CacheManager {
    pub fn new(store: Arc<dyn CacheStore>, operation_timeout: Duration) -> Self {
        Self {
            store,
            operation_timeout,
            stats: StatsCounters::default(),
        }
    }

    pub async fn get(&self, ctx: &OperationContext, key: &str) -> CacheResult<Option<Vec<u8>>> {
        ctx.bounded(self.operation_timeout, self.store.get(key)).await?
    }

    pub async fn set(
        &self,
        ctx: &OperationContext,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> CacheResult<()> {
        ctx.bounded(self.operation_timeout, self.store.set(key, value, ttl))
            .await?
    }

    pub async fn incr(&self, ctx: &OperationContext, key: &str, ttl: Duration) -> CacheResult<i64> {
        ctx.bounded(self.operation_timeout, self.store.incr(key, ttl))
            .await?
    }

    pub async fn keys_with_prefix(&self, ctx: &OperationContext, prefix: &str) -> CacheResult<Vec<String>> {
        ctx.bounded(self.operation_timeout, self.store.keys_with_prefix(prefix))
            .await?
    }

    pub async fn delete(&self, ctx: &OperationContext, keys: &[String]) -> CacheResult<u64> {
        ctx.bounded(self.operation_timeout, self.store.delete(keys))
            .await?
    }

    pub async fn health_check(&self, ctx: &OperationContext) -> CacheResult<bool> {
        ctx.bounded(self.operation_timeout, self.store.health_check())
            .await?
    }

    pub(crate) fn record_hit(&self) {
        self.stats.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_stale(&self) {
        self.stats.stale.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_read_error(&self) {
        self.stats.read_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write_error(&self) {
        self.stats.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_invalidation(&self) {
        self.stats.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            stale: self.stats.stale.load(Ordering::Relaxed),
            read_errors: self.stats.read_errors.load(Ordering::Relaxed),
            write_errors: self.stats.write_errors.load(Ordering::Relaxed),
            invalidations: self.stats.invalidations.load(Ordering::Relaxed),
        }
    }
}
