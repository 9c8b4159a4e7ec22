use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use draftline_core::realtime::EVENT_CONNECTED;
use futures::{SinkExt, StreamExt};
use serde_json::json;

use crate::state::AppState;
use crate::ws::RealtimeInputChannel;

/// HTTP handler that upgrades the connection to WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the session and tells the client its id.
///   2. Spawns a sender task that forwards messages from the registry channel.
///   3. Handles inbound frames in arrival order on the current task.
///   4. Unregisters on disconnect.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let registry = state.registry;
    let input = RealtimeInputChannel::new(state.submitter);

    // Register and get the receiver for outbound messages.
    let (session_id, mut rx) = registry.register().await;
    tracing::info!(session_id = %session_id, "WebSocket connected");

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_session_id = session_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(session_id = %sender_session_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // First frame tells the client its session id.
    registry
        .send_to(&session_id, EVENT_CONNECTED, json!({ "sessionId": session_id }))
        .await;

    // Receiver loop: one inbound frame at a time, in arrival order.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => input.handle_text(&session_id, text.as_str()).await,
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(session_id = %session_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(session_id = %session_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Clean up: remove connection and abort sender task.
    registry.unregister(&session_id).await;
    send_task.abort();
    tracing::info!(session_id = %session_id, "WebSocket disconnected");
}
