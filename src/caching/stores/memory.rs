//! # In-Memory Cache Store
//!
//! A `DashMap`-backed cache store with per-entry TTL. No background task
//! runs: an expired entry is dropped when it is next read, and the whole map
//! is swept for expired entries on every prefix listing and once every
//! [`SWEEP_INTERVAL`] writes.
//! Counters are stored as decimal strings, the same way Redis keeps them.

use super::CacheStore;
use crate::caching::{CacheError, CacheResult};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl MemoryEntry {
    fn new(value: Vec<u8>, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Writes between two full sweeps of expired entries
pub const SWEEP_INTERVAL: u64 = 256;

/// In-memory cache implementation
#[derive(Debug, Clone, Default)]
pub struct InMemoryCache {
    entries: Arc<DashMap<String, MemoryEntry>>,
    writes: Arc<AtomicU64>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| !e.value().is_expired()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored entries, expired ones included
    pub fn stored_len(&self) -> usize {
        self.entries.len()
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn cleanup_expired_entries(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        let cleaned = before.saturating_sub(self.entries.len());

        if cleaned > 0 {
            debug!("Cleaned up {} expired in-memory cache entries", cleaned);
        }
        cleaned
    }

    fn record_write(&self) {
        if (self.writes.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_INTERVAL == 0 {
            self.cleanup_expired_entries();
        }
    }

    fn incr_entry(&self, key: &str, ttl: Duration) -> CacheResult<i64> {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) if !occupied.get().is_expired() => {
                let entry = occupied.get_mut();
                let current: i64 = std::str::from_utf8(&entry.value)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| {
                        CacheError::store(format!("value at {} is not an integer", key))
                    })?;
                let next = current.checked_add(1).ok_or_else(|| {
                    CacheError::store(format!("value at {} would overflow", key))
                })?;
                entry.value = next.to_string().into_bytes();
                Ok(next)
            }
            Entry::Occupied(mut occupied) => {
                occupied.insert(MemoryEntry::new(b"1".to_vec(), ttl));
                Ok(1)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(MemoryEntry::new(b"1".to_vec(), ttl));
                Ok(1)
            }
        }
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.value.clone()));
            }
        } else {
            return Ok(None);
        }

        self.entries.remove_if(key, |_, entry| entry.is_expired());
        debug!("Dropped expired in-memory cache entry: {}", key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        self.entries
            .insert(key.to_string(), MemoryEntry::new(value.to_vec(), ttl));
        self.record_write();
        Ok(())
    }

    async fn incr(&self, key: &str, ttl: Duration) -> CacheResult<i64> {
        let result = self.incr_entry(key, ttl);
        self.record_write();
        result
    }

    async fn keys_with_prefix(&self, prefix: &str) -> CacheResult<Vec<String>> {
        self.cleanup_expired_entries();

        Ok(self
            .entries
            .iter()
            .filter(|e| e.key().starts_with(prefix) && !e.value().is_expired())
            .map(|e| e.key().clone())
            .collect())
    }

    async fn delete(&self, keys: &[String]) -> CacheResult<u64> {
        let mut deleted = 0;
        for key in keys {
            if let Some((_, entry)) = self.entries.remove(key) {
                if !entry.is_expired() {
                    deleted += 1;
                }
            }
        }
        Ok(deleted)
    }

    async fn health_check(&self) -> CacheResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_basic_operations() {
        let cache = InMemoryCache::new();
        let ttl = Duration::from_secs(60);

        cache.set("ads:limit:5", b"[]", ttl).await.unwrap();
        assert_eq!(cache.get("ads:limit:5").await.unwrap(), Some(b"[]".to_vec()));
        assert_eq!(cache.get("missing").await.unwrap(), None);

        let deleted = cache
            .delete(&["ads:limit:5".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let cache = InMemoryCache::new();
        cache.set("short", b"v", Duration::from_millis(20)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(cache.get("short").await.unwrap(), None);
        assert!(cache.keys_with_prefix("sh").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_incr_counts_from_one() {
        let cache = InMemoryCache::new();
        let ttl = Duration::from_secs(60);

        assert_eq!(cache.incr("adcount:2024-01-01", ttl).await.unwrap(), 1);
        assert_eq!(cache.incr("adcount:2024-01-01", ttl).await.unwrap(), 2);
        assert_eq!(
            cache.get("adcount:2024-01-01").await.unwrap(),
            Some(b"2".to_vec())
        );
    }

    #[tokio::test]
    async fn test_incr_rejects_non_integer() {
        let cache = InMemoryCache::new();
        cache.set("k", b"not a number", Duration::from_secs(60)).await.unwrap();
        assert!(matches!(
            cache.incr("k", Duration::from_secs(60)).await,
            Err(CacheError::Store { .. })
        ));
    }

    #[tokio::test]
    async fn test_incr_at_max_is_an_error() {
        let cache = InMemoryCache::new();
        let ttl = Duration::from_secs(60);
        cache.set("k", i64::MAX.to_string().as_bytes(), ttl).await.unwrap();

        assert!(matches!(cache.incr("k", ttl).await, Err(CacheError::Store { .. })));
        assert_eq!(cache.get("k").await.unwrap(), Some(i64::MAX.to_string().into_bytes()));
    }

    #[tokio::test]
    async fn test_prefix_listing_frees_expired_entries() {
        let cache = InMemoryCache::new();
        for i in 0..1000 {
            cache
                .set(&format!("ads:k{}", i), b"[]", Duration::from_millis(1))
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(cache.keys_with_prefix("ads:").await.unwrap().is_empty());
        cache.set("ads:fresh", b"[]", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stored_len(), 1);
    }

    #[tokio::test]
    async fn test_writes_sweep_expired_entries() {
        let cache = InMemoryCache::new();
        for i in 0..SWEEP_INTERVAL - 1 {
            cache
                .set(&format!("gone{}", i), b"v", Duration::from_millis(1))
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.stored_len(), (SWEEP_INTERVAL - 1) as usize);

        cache.set("kept", b"v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.stored_len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_incr_loses_no_updates() {
        let cache = InMemoryCache::new();
        let mut handles = Vec::new();

        for _ in 0..50 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.incr("counter", Duration::from_secs(60)).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(cache.get("counter").await.unwrap(), Some(b"50".to_vec()));
    }

    #[tokio::test]
    async fn test_prefix_listing() {
        let cache = InMemoryCache::new();
        let ttl = Duration::from_secs(60);
        cache.set("ads:age:20:limit:5:offset:0", b"[]", ttl).await.unwrap();
        cache.set("ads:limit:5:offset:0", b"[]", ttl).await.unwrap();
        cache.set("adcount:2024-01-01", b"3", ttl).await.unwrap();

        let mut keys = cache.keys_with_prefix("ads:").await.unwrap();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "ads:age:20:limit:5:offset:0".to_string(),
                "ads:limit:5:offset:0".to_string()
            ]
        );
    }
}
