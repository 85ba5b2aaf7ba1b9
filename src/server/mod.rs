//! HTTP and websocket boundary.
//!
//! Endpoints:
//! - `POST /events` - ingest one raw event, returns the enriched event
//! - `GET /events` - recency-window query for a victim address
//! - `GET /ws/events` - websocket: replay the window, then stream live
//! - `GET /status` - JSON operational snapshot
//! - `GET /metrics` - Prometheus-compatible metrics
//!
//! CORS is fully permissive: the feed is consumed by browser dashboards
//! served from arbitrary origins.

mod handlers;
mod types;

use axum::routing::{get, post};
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use handlers::{ingest_handler, metrics_handler, query_handler, status_handler, stream_handler};
pub use types::AppState;

/// Builds the service router over `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/events", post(ingest_handler).get(query_handler))
        .route("/ws/events", get(stream_handler))
        .route("/status", get(status_handler))
        .route("/metrics", get(metrics_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds the configured listener and serves until `shutdown` fires.
pub async fn start_server(
    config: &Config,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), anyhow::Error> {
    let bind_addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind server to {}: {}", bind_addr, e))?;

    let local_addr = listener
        .local_addr()
        .map_err(|e| anyhow::anyhow!("Failed to read bound address: {}", e))?;
    log::info!("attack feed listening on http://{}/", local_addr);
    log::info!("  - Ingest:  POST http://{}/events", local_addr);
    log::info!("  - Query:   GET  http://{}/events", local_addr);
    log::info!("  - Stream:  WS   ws://{}/ws/events", local_addr);
    log::info!("  - Status:  GET  http://{}/status", local_addr);

    let app = build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
