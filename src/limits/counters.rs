//! # Rate Limit Counters
//!
//! Per-day creation counters kept in the cache store, one integer entry per
//! calendar day (UTC) under their own key namespace. The namespace must not
//! overlap the listing namespace, otherwise listing invalidation would wipe
//! the counters.
//!
//! These are not authoritative counts. The active-advertisement count is
//! computed live from the document store instead.

use crate::caching::{CacheError, CacheManager, CacheResult};
use crate::core::context::OperationContext;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Date format of counter keys
const DAY_FORMAT: &str = "%Y-%m-%d";

/// Counter of advertisements created per UTC day
pub struct DailyCreationCounter {
    cache: Arc<CacheManager>,
    namespace: String,
    retention: Duration,
}

impl DailyCreationCounter {
    /// `retention` is how long a day's counter outlives its first increment
    pub fn new<S: Into<String>>(cache: Arc<CacheManager>, namespace: S, retention: Duration) -> Self {
        Self {
            cache,
            namespace: namespace.into(),
            retention,
        }
    }

    /// Date string identifying the counter for `now`
    pub fn day_of(now: DateTime<Utc>) -> String {
        now.format(DAY_FORMAT).to_string()
    }

    /// Cache key of a day's counter
    pub fn key_for(&self, day: &str) -> String {
        format!("{}:{}", self.namespace, day)
    }

    /// Current value of a day's counter; an absent counter reads as 0
    pub async fn current(&self, ctx: &OperationContext, day: &str) -> CacheResult<u64> {
        let key = self.key_for(day);
        let Some(raw) = self.cache.get(ctx, &key).await? else {
            return Ok(0);
        };

        std::str::from_utf8(&raw)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .ok_or_else(|| CacheError::store(format!("counter at {} is not an integer", key)))
    }

    /// Count one more creation on `day`, returning the new value
    pub async fn increment(&self, ctx: &OperationContext, day: &str) -> CacheResult<u64> {
        let key = self.key_for(day);
        let count = self.cache.incr(ctx, &key, self.retention).await?;

        debug!("Daily creation counter {} is now {}", key, count);
        Ok(count.max(0) as u64)
    }
}
