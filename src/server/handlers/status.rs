//! Operational status and metrics handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use strum::IntoEnumIterator;

use super::super::types::{AppState, ErrorCounts, StatusResponse};
use crate::error_handling::ErrorType;

/// `GET /status`: JSON operational snapshot.
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let stats = &state.stats;
    let validation = stats.get_error_count(ErrorType::InvalidSourceAddress)
        + stats.get_error_count(ErrorType::InvalidTargetAddress)
        + stats.get_error_count(ErrorType::NegativeBytes)
        + stats.get_error_count(ErrorType::InvalidWindow);

    Json(StatusResponse {
        uptime_seconds: state.started_at.elapsed().as_secs_f64(),
        events_retained: state.store.len(),
        events_ingested: stats.events_ingested(),
        deliveries: stats.deliveries(),
        active_subscribers: state.registry.subscriber_count().await,
        watched_addresses: state.registry.watched_address_count().await,
        geoip: state.geo_metadata.clone(),
        errors: ErrorCounts {
            total: stats.total_errors(),
            validation,
            geo_miss: stats.get_error_count(ErrorType::GeoLookupMiss),
            geo_timeout: stats.get_error_count(ErrorType::GeoLookupTimeout),
            delivery_failure: stats.get_error_count(ErrorType::SubscriberDeliveryFailure),
            stream_policy: stats.get_error_count(ErrorType::StreamPolicyViolation),
        },
    })
}

/// `GET /metrics`: Prometheus-compatible metrics.
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    let mut metrics = format!(
        r#"# HELP attack_globe_events_retained Number of events currently retained in memory
# TYPE attack_globe_events_retained gauge
attack_globe_events_retained {}

# HELP attack_globe_events_ingested_total Number of events ingested since startup
# TYPE attack_globe_events_ingested_total counter
attack_globe_events_ingested_total {}

# HELP attack_globe_deliveries_total Number of subscriber deliveries queued since startup
# TYPE attack_globe_deliveries_total counter
attack_globe_deliveries_total {}

# HELP attack_globe_active_subscribers Number of currently connected stream subscribers
# TYPE attack_globe_active_subscribers gauge
attack_globe_active_subscribers {}

# HELP attack_globe_errors_total Total number of degraded or rejected outcomes
# TYPE attack_globe_errors_total counter
attack_globe_errors_total {}
"#,
        state.store.len(),
        state.stats.events_ingested(),
        state.stats.deliveries(),
        state.registry.subscriber_count().await,
        state.stats.total_errors(),
    );

    metrics.push_str(
        "\n# HELP attack_globe_errors Degraded or rejected outcomes by kind\n# TYPE attack_globe_errors counter\n",
    );
    for error in ErrorType::iter() {
        metrics.push_str(&format!(
            "attack_globe_errors{{kind=\"{}\"}} {}\n",
            error.metric_name(),
            state.stats.get_error_count(error)
        ));
    }

    (StatusCode::OK, metrics).into_response()
}
