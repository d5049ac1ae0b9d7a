//! # HTTP Server
//!
//! Thin axum surface over [`AdvertisementService`]:
//!
//! | Method | Path              | Handler                      |
//! |--------|-------------------|------------------------------|
//! | POST   | `/api/v1/ad`      | [`handlers::create_ad`]      |
//! | GET    | `/api/v1/ad`      | [`handlers::list_ads`]       |
//! | GET    | `/api/v1/ad/:id`  | [`handlers::get_ad`]         |
//! | PUT    | `/api/v1/ad/:id`  | [`handlers::update_ad`]      |
//! | DELETE | `/api/v1/ad/:id`  | [`handlers::delete_ad`]      |
//! | GET    | `/health`         | [`handlers::health_check`]   |
//!
//! Every request runs under its own [`OperationContext`] whose deadline is
//! the configured request timeout. Request logging comes from `tower-http`'s
//! `TraceLayer`.

pub mod handlers;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::core::context::OperationContext;
use crate::service::AdvertisementService;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AdvertisementService>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(service: Arc<AdvertisementService>, request_timeout: Duration) -> Self {
        Self {
            service,
            request_timeout,
        }
    }

    /// Fresh context for one request
    pub fn context(&self) -> OperationContext {
        OperationContext::with_timeout(self.request_timeout)
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/ad", post(handlers::create_ad).get(handlers::list_ads))
        .route(
            "/api/v1/ad/:id",
            get(handlers::get_ad)
                .put(handlers::update_ad)
                .delete(handlers::delete_ad),
        )
        .route("/health", get(handlers::health_check))
        .layer(
            ServiceBuilder::new().layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            ),
        )
        .with_state(state)
}
