//! # Advertisement Service
//!
//! The API the HTTP layer calls into. It wires the store gateway, the
//! cache-aside read path, the invalidator and the creation counters
//! together.
//!
//! ## Creation admission
//! Creation is a pipeline of independently committed steps, stopping at the
//! first failure:
//!
//! 1. Validate the payload
//! 2. Reject if today's creation counter has reached the daily limit
//! 3. Reject if the live active count has reached the active limit
//! 4. Insert into the document store
//! 5. Increment today's counter
//! 6. Invalidate cached listings
//!
//! There is no transaction around the pipeline. A failure in step 5 or 6
//! leaves the advertisement persisted, and concurrent creations may pass
//! steps 2 and 3 together and overshoot a limit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::caching::{
    CacheInvalidator, CacheManager, CacheStats, ListingKeyGenerator, ListingReadPath,
};
use crate::core::config::{CacheConfig, LimitsConfig};
use crate::core::context::OperationContext;
use crate::core::error::{AdError, AdResult, LimitKind};
use crate::core::query::ListQuery;
use crate::core::types::{Advertisement, NewAdvertisement};
use crate::core::validation::validate_advertisement;
use crate::limits::DailyCreationCounter;
use crate::store::AdvertisementStore;

/// Reachability of the two backing stores
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub cache: bool,
    pub store: bool,
    pub cache_stats: CacheStats,
}

/// Advertisement management API
pub struct AdvertisementService {
    store: Arc<AdvertisementStore>,
    cache: Arc<CacheManager>,
    read_path: ListingReadPath,
    invalidator: CacheInvalidator,
    counter: DailyCreationCounter,
    daily_limit: u64,
    active_limit: u64,
}

impl AdvertisementService {
    pub fn new(
        cache: Arc<CacheManager>,
        store: Arc<AdvertisementStore>,
        cache_config: &CacheConfig,
        limits: &LimitsConfig,
    ) -> Self {
        let keys = ListingKeyGenerator::new(cache_config.namespace.clone());
        let invalidator = CacheInvalidator::new(cache.clone(), keys.prefix());
        let read_path = ListingReadPath::new(
            cache.clone(),
            store.clone(),
            keys,
            cache_config.ttl,
            cache_config.write_policy,
        );
        let counter = DailyCreationCounter::new(
            cache.clone(),
            limits.counter_namespace.clone(),
            limits.counter_retention,
        );

        Self {
            store,
            cache,
            read_path,
            invalidator,
            counter,
            daily_limit: limits.daily_limit,
            active_limit: limits.active_limit,
        }
    }

    /// Create an advertisement, subject to the daily and active limits
    pub async fn create(&self, ctx: &OperationContext, payload: NewAdvertisement) -> AdResult<Advertisement> {
        self.create_at(ctx, payload, Utc::now()).await
    }

    /// [`create`](Self::create) evaluated at a given instant
    pub async fn create_at(
        &self,
        ctx: &OperationContext,
        payload: NewAdvertisement,
        now: DateTime<Utc>,
    ) -> AdResult<Advertisement> {
        let payload = validate_advertisement(payload, now)?;

        let day = DailyCreationCounter::day_of(now);
        let created_today = self.counter.current(ctx, &day).await?;
        if created_today >= self.daily_limit {
            warn!("Daily creation limit reached ({} on {})", created_today, day);
            return Err(AdError::LimitExceeded {
                kind: LimitKind::Daily,
                limit: self.daily_limit,
            });
        }

        let active = self.store.count_active(ctx, now).await?;
        if active >= self.active_limit {
            warn!("Active advertisement limit reached ({})", active);
            return Err(AdError::LimitExceeded {
                kind: LimitKind::Active,
                limit: self.active_limit,
            });
        }

        let ad = self.store.insert(ctx, payload, now).await?;
        self.counter.increment(ctx, &day).await?;
        self.invalidator.invalidate_all(ctx).await?;

        info!("Created advertisement {} ({})", ad.id, ad.title);
        Ok(ad)
    }

    /// List advertisements matching raw query parameters
    pub async fn list(
        &self,
        ctx: &OperationContext,
        params: &HashMap<String, String>,
    ) -> AdResult<Vec<Advertisement>> {
        let query = ListQuery::from_params(params)?;
        self.read_path.list(ctx, &query, Utc::now()).await
    }

    /// List advertisements matching an already validated query at `now`
    pub async fn list_at(
        &self,
        ctx: &OperationContext,
        query: &ListQuery,
        now: DateTime<Utc>,
    ) -> AdResult<Vec<Advertisement>> {
        self.read_path.list(ctx, query, now).await
    }

    pub async fn get(&self, ctx: &OperationContext, id: &str) -> AdResult<Advertisement> {
        self.store
            .get(ctx, id)
            .await?
            .ok_or_else(|| AdError::not_found(id))
    }

    /// Replace an advertisement's title, window and conditions
    pub async fn update(
        &self,
        ctx: &OperationContext,
        id: &str,
        payload: NewAdvertisement,
    ) -> AdResult<Advertisement> {
        let now = Utc::now();
        let mut ad = self.get(ctx, id).await?;
        let payload = validate_advertisement(payload, now)?;

        ad.apply(payload);
        if !self.store.replace(ctx, &ad).await? {
            // Deleted between the read and the write
            return Err(AdError::not_found(id));
        }
        self.invalidator.invalidate_all(ctx).await?;

        info!("Updated advertisement {}", ad.id);
        Ok(ad)
    }

    pub async fn delete(&self, ctx: &OperationContext, id: &str) -> AdResult<()> {
        if !self.store.delete(ctx, id).await? {
            return Err(AdError::not_found(id));
        }
        self.invalidator.invalidate_all(ctx).await?;

        info!("Deleted advertisement {}", id);
        Ok(())
    }

    /// Probe both stores. A failed probe reports the store as down rather
    /// than failing the call.
    pub async fn health(&self, ctx: &OperationContext) -> HealthReport {
        let (cache, store) = tokio::join!(self.cache.health_check(ctx), self.store.health_check(ctx));
        let cache = cache.unwrap_or_else(|e| {
            warn!("Cache health check failed: {}", e);
            false
        });
        let store = store.unwrap_or_else(|e| {
            warn!("Store health check failed: {}", e);
            false
        });

        HealthReport {
            healthy: cache && store,
            cache,
            store,
            cache_stats: self.cache.stats(),
        }
    }
}
