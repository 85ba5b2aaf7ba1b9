//! Live event stream over websocket.
//!
//! `GET /ws/events?target_address=IP&window_minutes=N`: the server replays
//! the recency window, then forwards every subsequently broadcast event for
//! that address as one JSON text message each, until the client goes away.

use std::net::IpAddr;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};

use super::super::types::{ApiError, AppState, WindowParams};
use crate::config::{DEFAULT_WINDOW_MINUTES, WS_POLICY_VIOLATION};
use crate::error_handling::ErrorType;
use crate::models::Event;

/// Websocket upgrade handler.
///
/// A malformed `target_address` is refused with 400 before the upgrade. A
/// non-positive window follows the wire contract instead: accept the
/// upgrade, then close with the policy-violation code.
pub async fn stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WindowParams>,
) -> Response {
    let target: IpAddr = match params.target_address.trim().parse() {
        Ok(target) => target,
        Err(_) => {
            state
                .stats
                .increment_error(ErrorType::InvalidTargetAddress);
            return ApiError::Validation(format!(
                "invalid target_address: {:?}",
                params.target_address
            ))
            .into_response();
        }
    };
    let window_minutes = params.window_minutes.unwrap_or(DEFAULT_WINDOW_MINUTES);

    ws.on_upgrade(move |socket| async move {
        if window_minutes <= 0 {
            refuse_socket(socket, state).await;
        } else {
            handle_socket(socket, state, target, window_minutes).await;
        }
    })
}

/// Closes a freshly accepted socket with the policy-violation code.
async fn refuse_socket(mut socket: WebSocket, state: AppState) {
    state
        .stats
        .increment_error(ErrorType::StreamPolicyViolation);
    log::info!("refusing stream subscription: non-positive window");
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: WS_POLICY_VIOLATION,
            reason: "window_minutes must be positive".into(),
        })))
        .await;
}

/// Manages one subscriber connection from replay through disconnect.
async fn handle_socket(socket: WebSocket, state: AppState, target: IpAddr, window_minutes: i64) {
    let (mut sender, mut receiver) = socket.split();

    // Register before replaying. An event ingested between registration and
    // the replay query is delivered twice (once in the replay, once via the
    // channel); registering afterwards could miss it entirely. At-least-once
    // is the accepted contract.
    let (subscriber_id, mut events) = state.registry.connect(target).await;
    log::info!(
        "stream subscriber {} watching {} (window {}m)",
        subscriber_id,
        target,
        window_minutes
    );

    let replay = state.store.recent_for_target(target, window_minutes);
    log::debug!(
        "replaying {} events to subscriber {}",
        replay.len(),
        subscriber_id
    );
    for event in &replay {
        if send_event(&mut sender, event).await.is_err() {
            state.registry.disconnect(target, subscriber_id).await;
            return;
        }
    }

    // Forward broadcast deliveries until the channel or the socket dies.
    let forward_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if send_event(&mut sender, &event).await.is_err() {
                break;
            }
        }
    });

    // Drain the client side. Inbound frames are ignored; a close frame or a
    // transport error ends the subscription.
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                log::debug!("stream subscriber {} transport error: {}", subscriber_id, e);
                break;
            }
        }
    }

    state.registry.disconnect(target, subscriber_id).await;
    forward_task.abort();
    log::info!(
        "stream subscriber {} for {} disconnected",
        subscriber_id,
        target
    );
}

/// Encodes and sends one event as a JSON text frame.
async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &Event,
) -> Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(payload) => sender.send(Message::Text(payload)).await,
        Err(e) => {
            log::warn!("failed to encode event for stream delivery: {}", e);
            Ok(())
        }
    }
}
