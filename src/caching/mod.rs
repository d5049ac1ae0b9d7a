//! # Caching System Module
//!
//! Cache-aside caching for advertisement listings, plus the cache store the
//! rate limit counters live in.
//!
//! ## Architecture
//! 1. **Cache Stores**: the [`CacheStore`] trait with Redis and in-memory implementations
//! 2. **Cache Manager**: bounds every store call by a timeout and the caller's cancellation
//! 3. **Key Generator**: canonical cache keys from query parameters
//! 4. **Read Path**: lookup, freshness check, store fallback, write-back
//! 5. **Invalidation**: prefix-wide deletion after writes
//!
//! ## Usage Example
//! ```rust,ignore
//! let store: Arc<dyn CacheStore> = Arc::new(InMemoryCache::new());
//! let cache = Arc::new(CacheManager::new(store, Duration::from_secs(5)));
//!
//! let key = ListingKeyGenerator::new("ads").generate(&query.to_params());
//! cache.set(&ctx, &key, b"[]", Duration::from_secs(3600)).await?;
//! ```

pub mod cache_manager;
pub mod invalidation;
pub mod key_generator;
pub mod read_path;
pub mod stores;

pub use cache_manager::{CacheManager, CacheStats};
pub use invalidation::CacheInvalidator;
pub use key_generator::ListingKeyGenerator;
pub use read_path::{CacheWritePolicy, ListingReadPath};
pub use stores::{CacheStore, InMemoryCache, RedisCache, RedisCacheConfig};

use crate::core::context::Interrupted;

/// Cache operation result
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-specific error types
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache store error: {message}")]
    Store { message: String },

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Cache operation cancelled")]
    Cancelled,

    #[error("Cache not available")]
    Unavailable,
}

impl CacheError {
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}

impl From<Interrupted> for CacheError {
    fn from(interrupted: Interrupted) -> Self {
        match interrupted {
            Interrupted::TimedOut(timeout) => Self::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            },
            Interrupted::Cancelled => Self::Cancelled,
        }
    }
}
