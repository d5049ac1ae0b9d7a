//! # In-Memory Document Store
//!
//! `DashMap`-backed document store. Records get a UUID v4 identifier on
//! insert. Queries evaluate [`AdFilter`] against every record, so the cost
//! is linear in the collection size.

use super::{AdFilter, DocumentStore, StoreResult};
use crate::core::types::{Advertisement, NewAdvertisement};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// In-memory document store implementation
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    records: Arc<DashMap<String, Advertisement>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, ad: NewAdvertisement, created_at: DateTime<Utc>) -> StoreResult<Advertisement> {
        let record = Advertisement::from_new(Uuid::new_v4().to_string(), created_at, ad);
        self.records.insert(record.id.clone(), record.clone());

        debug!("Inserted advertisement {}", record.id);
        Ok(record)
    }

    async fn count_active(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.value().is_active_at(now))
            .count() as u64)
    }

    async fn find(&self, filter: &AdFilter, limit: u32, offset: u64) -> StoreResult<Vec<Advertisement>> {
        let mut matched: Vec<Advertisement> = self
            .records
            .iter()
            .filter(|r| filter.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();

        // Ties on endAt fall back to insertion time then id, so paging is stable
        matched.sort_by(|a, b| {
            a.end_at
                .cmp(&b.end_at)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(matched
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Advertisement>> {
        Ok(self.records.get(id).map(|r| r.value().clone()))
    }

    async fn replace(&self, ad: &Advertisement) -> StoreResult<bool> {
        match self.records.get_mut(&ad.id) {
            Some(mut existing) => {
                *existing = ad.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        Ok(self.records.remove(id).is_some())
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Conditions;
    use chrono::Duration;

    fn payload(title: &str, now: DateTime<Utc>, ends_in_hours: i64) -> NewAdvertisement {
        NewAdvertisement {
            title: title.to_string(),
            start_at: now - Duration::hours(1),
            end_at: now + Duration::hours(ends_in_hours),
            conditions: Conditions::default(),
        }
    }

    #[tokio::test]
    async fn test_find_sorts_by_end_and_pages() {
        let store = InMemoryDocumentStore::new();
        let now = Utc::now();
        store.insert(payload("late", now, 30), now).await.unwrap();
        store.insert(payload("early", now, 10), now).await.unwrap();
        store.insert(payload("middle", now, 20), now).await.unwrap();

        let filter = AdFilter::active_at(now);
        let titles: Vec<String> = store
            .find(&filter, 10, 0)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["early", "middle", "late"]);

        let page = store.find(&filter, 1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "middle");

        assert!(store.find(&filter, 5, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_count_active() {
        let store = InMemoryDocumentStore::new();
        let now = Utc::now();
        store.insert(payload("a", now, 1), now).await.unwrap();
        store.insert(payload("b", now, 48), now).await.unwrap();

        assert_eq!(store.count_active(now).await.unwrap(), 2);
        assert_eq!(store.count_active(now + Duration::hours(2)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_replace_delete() {
        let store = InMemoryDocumentStore::new();
        let now = Utc::now();
        let mut record = store.insert(payload("a", now, 1), now).await.unwrap();

        assert_eq!(store.get(&record.id).await.unwrap(), Some(record.clone()));

        record.title = "renamed".to_string();
        assert!(store.replace(&record).await.unwrap());
        assert_eq!(store.get(&record.id).await.unwrap().unwrap().title, "renamed");

        assert!(store.delete(&record.id).await.unwrap());
        assert!(!store.delete(&record.id).await.unwrap());
        assert!(!store.replace(&record).await.unwrap());
        assert!(store.is_empty());
    }
}
