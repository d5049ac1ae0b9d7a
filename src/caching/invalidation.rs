//! # Cache Invalidation Module
//!
//! Coarse, prefix-wide invalidation of cached listings. After any write to
//! the advertisement collection every key under the listing namespace is
//! deleted, so no later read can observe a result set computed before the
//! write. There is no targeted invalidation of only the affected keys.
//!
//! Listing the keys costs a full prefix scan of the cache store, which
//! grows with the number of cached listings. That is the scalability bound
//! of this scheme.

use super::{CacheManager, CacheResult};
use crate::core::context::OperationContext;
use std::sync::Arc;
use tracing::{debug, info};

/// Deletes every cached listing under a namespace prefix
pub struct CacheInvalidator {
    cache: Arc<CacheManager>,
    prefix: String,
}

impl CacheInvalidator {
    pub fn new<S: Into<String>>(cache: Arc<CacheManager>, prefix: S) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Delete all keys under the prefix, returning how many were removed
    pub async fn invalidate_all(&self, ctx: &OperationContext) -> CacheResult<u64> {
        let keys = self.cache.keys_with_prefix(ctx, &self.prefix).await?;
        if keys.is_empty() {
            debug!("No cached listings under {} to invalidate", self.prefix);
            return Ok(0);
        }

        let deleted = self.cache.delete(ctx, &keys).await?;
        self.cache.record_invalidation();

        info!("Invalidated {} cached listings under {}", deleted, self.prefix);
        Ok(deleted)
    }
}
