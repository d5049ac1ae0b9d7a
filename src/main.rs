//! # Advertisement Service - Main Entry Point
//!
//! Loads configuration, installs logging, connects the cache store, builds
//! the service and serves HTTP until SIGINT or SIGTERM.

use anyhow::Context;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use ad_service::caching::{CacheManager, CacheStore, InMemoryCache, RedisCache};
use ad_service::core::config::CacheBackend;
use ad_service::observability::init_logging;
use ad_service::store::{AdvertisementStore, InMemoryDocumentStore};
use ad_service::{build_router, AdvertisementService, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::load().await.context("Failed to load configuration")?;
    init_logging(&config.logging);

    info!("🚀 Starting advertisement service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let cache_store: Arc<dyn CacheStore> = match config.cache.backend {
        CacheBackend::Redis => {
            info!("🔗 Connecting to Redis at {}", config.redis.url);
            let redis = RedisCache::new(config.redis.clone()).await.map_err(|e| {
                error!("Failed to connect to Redis: {}", e);
                e
            })?;
            Arc::new(redis)
        }
        CacheBackend::Memory => {
            warn!("Using in-memory cache store; counters and listings are not shared between instances");
            Arc::new(InMemoryCache::new())
        }
    };

    let cache = Arc::new(CacheManager::new(cache_store, config.cache.operation_timeout));
    let store = Arc::new(AdvertisementStore::new(
        Arc::new(InMemoryDocumentStore::new()),
        config.store.operation_timeout,
    ));
    let service = Arc::new(AdvertisementService::new(cache, store, &config.cache, &config.limits));

    let app = build_router(AppState::new(service, config.server.request_timeout));

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;
    info!("🌐 Advertisement service ready on {}", config.server.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("✅ Advertisement service shutdown complete");
    Ok(())
}

/// Resolves on the first SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("📡 Received SIGINT, initiating graceful shutdown..."),
        _ = terminate => info!("📡 Received SIGTERM, initiating graceful shutdown..."),
    }
}
