//! # Document Store Module
//!
//! The document store collaborator that owns durable advertisement records,
//! the filter expression it is queried with, and the gateway the service
//! talks to.

pub mod filter;
pub mod gateway;
pub mod memory;

pub use filter::AdFilter;
pub use gateway::AdvertisementStore;
pub use memory::InMemoryDocumentStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::context::Interrupted;
use crate::core::types::{Advertisement, NewAdvertisement};

/// Store operation result
pub type StoreResult<T> = Result<T, StoreError>;

/// Document store error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Document store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Document store operation failed: {message}")]
    Operation { message: String },

    #[error("Document store operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Document store operation cancelled")]
    Cancelled,
}

impl StoreError {
    pub fn operation<S: Into<String>>(message: S) -> Self {
        Self::Operation {
            message: message.into(),
        }
    }
}

impl From<Interrupted> for StoreError {
    fn from(interrupted: Interrupted) -> Self {
        match interrupted {
            Interrupted::TimedOut(timeout) => Self::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            },
            Interrupted::Cancelled => Self::Cancelled,
        }
    }
}

/// Trait for document store implementations
///
/// Implementations must be safe for concurrent use. No operation retries.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a new advertisement, assigning its identifier
    async fn insert(&self, ad: NewAdvertisement, created_at: DateTime<Utc>) -> StoreResult<Advertisement>;

    /// Count advertisements whose active window contains `now`
    async fn count_active(&self, now: DateTime<Utc>) -> StoreResult<u64>;

    /// Advertisements matching `filter`, ordered by ascending `endAt`,
    /// skipping `offset` and capped at `limit`
    async fn find(&self, filter: &AdFilter, limit: u32, offset: u64) -> StoreResult<Vec<Advertisement>>;

    async fn get(&self, id: &str) -> StoreResult<Option<Advertisement>>;

    /// Replace a stored record by id. Returns false if no such record exists.
    async fn replace(&self, ad: &Advertisement) -> StoreResult<bool>;

    /// Delete a record by id. Returns false if no such record exists.
    async fn delete(&self, id: &str) -> StoreResult<bool>;

    async fn health_check(&self) -> StoreResult<bool>;
}
