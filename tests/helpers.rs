// Shared test helpers for spawning the service on an ephemeral port.
//
// Each test gets its own full service instance (disabled geo resolver, empty
// store) so counters and retained events are deterministic per test.

use std::net::SocketAddr;

use attack_globe::{build_router, AppState, GeoResolver};

/// Spawns the full service on an ephemeral loopback port and returns the
/// bound address.
#[allow(dead_code)] // Used by other test files
pub async fn spawn_server() -> SocketAddr {
    let state = AppState::new(GeoResolver::disabled());
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind ephemeral test port");
    let addr = listener.local_addr().expect("Failed to read bound address");

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Test server failed");
    });

    addr
}

/// Builds a raw event body for POST /events.
#[allow(dead_code)]
pub fn event_body(source: &str, target: &str, bytes: i64) -> serde_json::Value {
    serde_json::json!({
        "source_address": source,
        "target_address": target,
        "bytes_sent": bytes,
    })
}
