//! # Advertisement Store Gateway
//!
//! The service's only path to the document store. Each call is bounded by
//! the per-call store timeout and the caller's [`OperationContext`]; a
//! timeout or a backend failure comes back as a [`StoreError`](super::StoreError).
//! Nothing is retried.

use super::{AdFilter, DocumentStore, StoreResult};
use crate::core::context::OperationContext;
use crate::core::types::{Advertisement, NewAdvertisement};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Timeout-bounded access to the advertisement collection
pub struct AdvertisementStore {
    store: Arc<dyn DocumentStore>,
    operation_timeout: Duration,
}

impl AdvertisementStore {
    pub fn new(store: Arc<dyn DocumentStore>, operation_timeout: Duration) -> Self {
        Self {
            store,
            operation_timeout,
        }
    }

    pub async fn insert(
        &self,
        ctx: &OperationContext,
        ad: NewAdvertisement,
        created_at: DateTime<Utc>,
    ) -> StoreResult<Advertisement> {
        ctx.bounded(self.operation_timeout, self.store.insert(ad, created_at))
            .await?
    }

    pub async fn count_active(&self, ctx: &OperationContext, now: DateTime<Utc>) -> StoreResult<u64> {
        ctx.bounded(self.operation_timeout, self.store.count_active(now))
            .await?
    }

    /// Matching advertisements ordered by ascending end of active window.
    /// No match is an empty list.
    pub async fn query(
        &self,
        ctx: &OperationContext,
        filter: &AdFilter,
        limit: u32,
        offset: u64,
    ) -> StoreResult<Vec<Advertisement>> {
        debug!(
            filter = %filter.to_document(),
            limit,
            offset,
            "Querying advertisements"
        );
        ctx.bounded(self.operation_timeout, self.store.find(filter, limit, offset))
            .await?
    }

    pub async fn get(&self, ctx: &OperationContext, id: &str) -> StoreResult<Option<Advertisement>> {
        ctx.bounded(self.operation_timeout, self.store.get(id))
            .await?
    }

    pub async fn replace(&self, ctx: &OperationContext, ad: &Advertisement) -> StoreResult<bool> {
        ctx.bounded(self.operation_timeout, self.store.replace(ad))
            .await?
    }

    pub async fn delete(&self, ctx: &OperationContext, id: &str) -> StoreResult<bool> {
        ctx.bounded(self.operation_timeout, self.store.delete(id))
            .await?
    }

    pub async fn health_check(&self, ctx: &OperationContext) -> StoreResult<bool> {
        ctx.bounded(self.operation_timeout, self.store.health_check())
            .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryDocumentStore, StoreError};
    use async_trait::async_trait;

    struct HangingStore;

    #[async_trait]
    impl DocumentStore for HangingStore {
        async fn insert(&self, _ad: NewAdvertisement, _created_at: DateTime<Utc>) -> StoreResult<Advertisement> {
            std::future::pending().await
        }
        async fn count_active(&self, _now: DateTime<Utc>) -> StoreResult<u64> {
            std::future::pending().await
        }
        async fn find(&self, _filter: &AdFilter, _limit: u32, _offset: u64) -> StoreResult<Vec<Advertisement>> {
            std::future::pending().await
        }
        async fn get(&self, _id: &str) -> StoreResult<Option<Advertisement>> {
            std::future::pending().await
        }
        async fn replace(&self, _ad: &Advertisement) -> StoreResult<bool> {
            std::future::pending().await
        }
        async fn delete(&self, _id: &str) -> StoreResult<bool> {
            std::future::pending().await
        }
        async fn health_check(&self) -> StoreResult<bool> {
            Ok(false)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_store_times_out() {
        let gateway = AdvertisementStore::new(Arc::new(HangingStore), Duration::from_secs(10));
        let result = gateway.count_active(&OperationContext::new(), Utc::now()).await;
        assert!(matches!(result, Err(StoreError::Timeout { timeout_ms: 10_000 })));
    }

    #[tokio::test]
    async fn test_empty_match_is_empty_list() {
        let gateway = AdvertisementStore::new(Arc::new(InMemoryDocumentStore::new()), Duration::from_secs(10));
        let ads = gateway
            .query(&OperationContext::new(), &AdFilter::active_at(Utc::now()), 5, 0)
            .await
            .unwrap();
        assert!(ads.is_empty());
    }
}
