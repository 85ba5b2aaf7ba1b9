//! Event ingestion and recency-window query handlers.

use std::net::IpAddr;

use axum::extract::{Query, State};
use axum::Json;

use super::super::types::{ApiError, AppState, WindowParams};
use crate::config::DEFAULT_WINDOW_MINUTES;
use crate::error_handling::{ErrorType, IngestStats};
use crate::models::{Event, RawEvent};

/// `POST /events`: ingest one raw event and return its enriched form.
pub async fn ingest_handler(
    State(state): State<AppState>,
    Json(raw): Json<RawEvent>,
) -> Result<Json<Event>, ApiError> {
    state
        .pipeline
        .ingest(raw)
        .await
        .map(Json)
        .map_err(|error| ApiError::Validation(error.to_string()))
}

/// `GET /events`: ordered events for a victim address within the window.
pub async fn query_handler(
    State(state): State<AppState>,
    Query(params): Query<WindowParams>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let (target, window_minutes) = validate_window_params(&params, &state.stats)?;
    Ok(Json(state.store.recent_for_target(target, window_minutes)))
}

/// Validates the `target_address`/`window_minutes` parameter pair shared by
/// the query and stream endpoints.
pub(in crate::server) fn validate_window_params(
    params: &WindowParams,
    stats: &IngestStats,
) -> Result<(IpAddr, i64), ApiError> {
    let target: IpAddr = params.target_address.trim().parse().map_err(|_| {
        stats.increment_error(ErrorType::InvalidTargetAddress);
        ApiError::Validation(format!(
            "invalid target_address: {:?}",
            params.target_address
        ))
    })?;

    let window_minutes = params.window_minutes.unwrap_or(DEFAULT_WINDOW_MINUTES);
    if window_minutes <= 0 {
        stats.increment_error(ErrorType::InvalidWindow);
        return Err(ApiError::Validation(format!(
            "window_minutes must be positive, got {}",
            window_minutes
        )));
    }

    Ok((target, window_minutes))
}
