//! Boundary request/response types and shared handler state.

use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

use crate::error_handling::IngestStats;
use crate::geoip::GeoIpMetadata;
use crate::pipeline::IngestionPipeline;
use crate::registry::SubscriptionRegistry;
use crate::store::EventStore;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// The process-wide ingestion pipeline.
    pub pipeline: Arc<IngestionPipeline>,
    /// The process-wide event store (read side for queries and replay).
    pub store: Arc<EventStore>,
    /// The process-wide subscriber registry.
    pub registry: Arc<SubscriptionRegistry>,
    /// Operational counters.
    pub stats: Arc<IngestStats>,
    /// Metadata of the loaded GeoIP database, if any.
    pub geo_metadata: Option<GeoIpMetadata>,
    /// Process start time, for uptime reporting.
    pub started_at: Instant,
}

/// Query parameters shared by `GET /events` and the stream endpoint.
#[derive(Debug, Deserialize)]
pub struct WindowParams {
    /// Victim address to filter on.
    pub target_address: String,
    /// Recency window in minutes; defaults to `DEFAULT_WINDOW_MINUTES`.
    pub window_minutes: Option<i64>,
}

/// JSON error body for rejected requests.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable description of the rejection.
    pub error: String,
}

/// Boundary rejection, mapped onto an HTTP response.
#[derive(Debug)]
pub enum ApiError {
    /// Invalid input: malformed address, negative byte count, or
    /// non-positive window. Always a 400.
    Validation(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse { error: message }),
            )
                .into_response(),
        }
    }
}

/// JSON response for the `/status` endpoint.
#[derive(Serialize)]
pub struct StatusResponse {
    pub uptime_seconds: f64,
    pub events_retained: usize,
    pub events_ingested: usize,
    pub deliveries: usize,
    pub active_subscribers: usize,
    pub watched_addresses: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geoip: Option<GeoIpMetadata>,
    pub errors: ErrorCounts,
}

/// Error counters grouped for the `/status` endpoint.
#[derive(Serialize)]
pub struct ErrorCounts {
    pub total: usize,
    pub validation: usize,
    pub geo_miss: usize,
    pub geo_timeout: usize,
    pub delivery_failure: usize,
    pub stream_policy: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_maps_to_400() {
        let response = ApiError::Validation("window_minutes must be positive".into())
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_response_serializes_message() {
        let body = serde_json::to_value(ErrorResponse {
            error: "invalid target_address".into(),
        })
        .unwrap();
        assert_eq!(body["error"], "invalid target_address");
    }
}
