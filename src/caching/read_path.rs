//! # Cache-Aside Read Path
//!
//! Serves listing queries from the cache when possible and from the
//! document store otherwise:
//!
//! 1. Canonicalize the query parameters into a key
//! 2. Look the key up; a failed lookup counts as a miss
//! 3. A hit is served only if no cached advertisement has ended
//! 4. On a miss or a stale hit, query the store
//! 5. Write the fetched result back under the key
//!
//! A failed write-back is handled according to [`CacheWritePolicy`].
//! Cancellation is never swallowed: a cancelled lookup or write-back ends
//! the request.

use super::{CacheError, CacheManager, ListingKeyGenerator};
use crate::core::context::OperationContext;
use crate::core::error::{AdError, AdResult};
use crate::core::query::ListQuery;
use crate::core::types::Advertisement;
use crate::store::{AdFilter, AdvertisementStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// What a failed cache write-back does to the read that triggered it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheWritePolicy {
    /// Fail the read with the cache error
    Fail,
    /// Log the failure and return the fetched result anyway
    #[default]
    Ignore,
}

impl std::str::FromStr for CacheWritePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "ignore" => Ok(Self::Ignore),
            other => Err(format!("unknown cache write policy: {}", other)),
        }
    }
}

/// Cache-aside listing reads
pub struct ListingReadPath {
    cache: Arc<CacheManager>,
    store: Arc<AdvertisementStore>,
    keys: ListingKeyGenerator,
    ttl: Duration,
    write_policy: CacheWritePolicy,
}

impl ListingReadPath {
    pub fn new(
        cache: Arc<CacheManager>,
        store: Arc<AdvertisementStore>,
        keys: ListingKeyGenerator,
        ttl: Duration,
        write_policy: CacheWritePolicy,
    ) -> Self {
        Self {
            cache,
            store,
            keys,
            ttl,
            write_policy,
        }
    }

    /// Cache key a query is stored under
    pub fn cache_key(&self, query: &ListQuery) -> String {
        self.keys.generate(&query.to_params())
    }

    /// Advertisements matching `query` at `now`
    pub async fn list(
        &self,
        ctx: &OperationContext,
        query: &ListQuery,
        now: DateTime<Utc>,
    ) -> AdResult<Vec<Advertisement>> {
        let key = self.cache_key(query);

        if let Some(cached) = self.lookup(ctx, &key).await? {
            if cached.iter().any(|ad| ad.has_ended_before(now)) {
                debug!("Cached listing {} is stale", key);
                self.cache.record_stale();
            } else {
                debug!("Cache hit for {}", key);
                self.cache.record_hit();
                return Ok(cached);
            }
        } else {
            debug!("Cache miss for {}", key);
            self.cache.record_miss();
        }

        let filter = AdFilter::from_query(query, now);
        let ads = self
            .store
            .query(ctx, &filter, query.limit, query.offset)
            .await?;

        self.write_back(ctx, &key, &ads).await?;
        Ok(ads)
    }

    /// Cached listing under `key`, if one can be read and decoded
    async fn lookup(&self, ctx: &OperationContext, key: &str) -> AdResult<Option<Vec<Advertisement>>> {
        let raw = match self.cache.get(ctx, key).await {
            Ok(raw) => raw,
            Err(CacheError::Cancelled) => return Err(AdError::Cancelled),
            Err(e) => {
                warn!("Cache read for {} failed, falling back to store: {}", key, e);
                self.cache.record_read_error();
                return Ok(None);
            }
        };

        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_slice(&raw) {
            Ok(ads) => Ok(Some(ads)),
            Err(e) => {
                warn!("Discarding undecodable cached listing {}: {}", key, e);
                self.cache.record_read_error();
                Ok(None)
            }
        }
    }

    async fn write_back(&self, ctx: &OperationContext, key: &str, ads: &[Advertisement]) -> AdResult<()> {
        let result = match serde_json::to_vec(ads) {
            Ok(payload) => self.cache.set(ctx, key, &payload, self.ttl).await,
            Err(e) => Err(CacheError::from(e)),
        };

        match result {
            Ok(()) => Ok(()),
            Err(CacheError::Cancelled) => Err(AdError::Cancelled),
            Err(e) => {
                self.cache.record_write_error();
                match self.write_policy {
                    CacheWritePolicy::Fail => Err(e.into()),
                    CacheWritePolicy::Ignore => {
                        warn!("Cache write for {} failed, serving uncached result: {}", key, e);
                        Ok(())
                    }
                }
            }
        }
    }
}
