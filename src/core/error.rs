//! # Error Handling Module
//!
//! Error taxonomy for the advertisement service, built on `thiserror`.
//!
//! Each layer owns its own error type:
//! - [`CacheError`](crate::caching::CacheError) for the cache store
//! - [`StoreError`](crate::store::StoreError) for the document store
//! - [`AdError`] for everything the service exposes to its callers
//!
//! Lower-level errors convert into [`AdError`] through `From`, so service code
//! can use `?` across layers. None of these errors is process-fatal; all of
//! them are returned to the caller of the service API and, at the HTTP edge,
//! mapped to a status code by the [`IntoResponse`] implementation below.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use thiserror::Error;

use crate::caching::CacheError;
use crate::store::StoreError;

/// Main result type used throughout the service
pub type AdResult<T> = Result<T, AdError>;

/// Which creation limit was hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKind {
    /// Advertisements created today
    Daily,
    /// Advertisements whose active window contains "now"
    Active,
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Active => write!(f, "active"),
        }
    }
}

/// Errors returned by the advertisement service API
#[derive(Debug, Error)]
pub enum AdError {
    /// Malformed or out-of-range input. Never retried.
    #[error("Validation failed: {field} - {reason}")]
    Validation { field: String, reason: String },

    /// Daily or active-count cap reached
    #[error("Cannot create more ads: {kind} limit of {limit} reached")]
    LimitExceeded { kind: LimitKind, limit: u64 },

    /// No advertisement with the given identifier
    #[error("Advertisement not found: {id}")]
    NotFound { id: String },

    /// Document store unavailable or operation failed
    #[error(transparent)]
    Store(StoreError),

    /// Cache store unavailable or operation failed
    #[error(transparent)]
    Cache(CacheError),

    /// The caller cancelled the operation or its deadline expired
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl AdError {
    /// Create a validation error for a specific field
    pub fn validation<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(id: S) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::LimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Timeout { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(StoreError::Unavailable { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Cache(CacheError::Timeout { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Cache(CacheError::Unavailable) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Cancelled => StatusCode::REQUEST_TIMEOUT,
            Self::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error type for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::LimitExceeded { .. } => "limit_exceeded",
            Self::NotFound { .. } => "not_found",
            Self::Store(_) => "store_error",
            Self::Cache(_) => "cache_error",
            Self::Cancelled => "cancelled",
            Self::Configuration { .. } => "configuration_error",
        }
    }
}

/// Cancellation surfaces as [`AdError::Cancelled`] no matter which layer saw it.
impl From<StoreError> for AdError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Cancelled => Self::Cancelled,
            other => Self::Store(other),
        }
    }
}

impl From<CacheError> for AdError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Cancelled => Self::Cancelled,
            other => Self::Cache(other),
        }
    }
}

impl From<serde_yaml::Error> for AdError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::config(format!("Failed to parse config: {}", err))
    }
}

/// Convert errors into JSON HTTP responses with the matching status code
impl IntoResponse for AdError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_response = json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
                "type": self.error_type(),
            }
        });

        (status, Json(error_response)).into_response()
    }
}
