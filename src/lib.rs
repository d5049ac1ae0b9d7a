//! # Advertisement Service - Core Library Crate
//!
//! An advertisement management API: create advertisements with targeting
//! conditions and list the ones matching a viewer's age, gender, country and
//! platform. Listings are served through a cache-aside layer in front of the
//! document store, and creation is capped per day and by active count.
//!
//! ## Module Layout
//! - [`core`]: error taxonomy, configuration, domain types, validation and
//!   per-request cancellation
//! - [`caching`]: cache stores, key canonicalization, the cache-aside read
//!   path and prefix invalidation
//! - [`limits`]: daily creation counters
//! - [`store`]: document store collaborator and its gateway
//! - [`service`]: the API the HTTP layer calls
//! - [`server`]: axum routes and handlers
//! - [`observability`]: tracing subscriber setup

/// Core functionality including error types, configuration, and basic data structures
pub mod core;

/// Caching system for listing results and rate limit counters
/// Supports multiple storage backends: in-memory, Redis
pub mod caching;

/// Creation rate limit counters
pub mod limits;

/// Document store for advertisement records
pub mod store;

/// Advertisement service orchestrating store, cache and limits
pub mod service;

/// HTTP surface
pub mod server;

/// Logging setup
pub mod observability;

/// Main error type used throughout the service
pub use crate::core::error::{AdError, AdResult, LimitKind};

/// Main configuration structure
pub use crate::core::config::ServiceConfig;

pub use crate::core::context::OperationContext;
pub use crate::core::query::ListQuery;
pub use crate::core::types::{Advertisement, Conditions, Gender, NewAdvertisement, Platform};

pub use server::{build_router, AppState};
pub use service::{AdvertisementService, HealthReport};
