use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use draftline_core::realtime::RealtimeFrame;
use draftline_core::types::{SessionId, Timestamp};
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// A live client connection.
pub struct Session {
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
}

/// Tracks live client connections by session id.
///
/// Created once at server start and injected wherever events are
/// delivered. All mutations and sends go through one `RwLock`, so a
/// register or unregister never interleaves with a `send_to` or
/// `broadcast` in progress.
pub struct ConnectionRegistry {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl ConnectionRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection under a fresh session id.
    ///
    /// Returns the id and the receiver half of the message channel so the
    /// caller can forward messages to the WebSocket sink.
    pub async fn register(&self) -> (SessionId, mpsc::UnboundedReceiver<Message>) {
        let session_id = uuid::Uuid::new_v4().to_string();
        let rx = self.register_as(session_id.clone()).await;
        (session_id, rx)
    }

    /// Register a connection under a known id, replacing any previous
    /// connection with that id.
    pub async fn register_as(&self, session_id: SessionId) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Session {
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.sessions.write().await.insert(session_id, session);
        rx
    }

    /// Remove a connection. Unknown ids are ignored.
    pub async fn unregister(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }

    /// Send an event to one session.
    ///
    /// Returns `false` when the session is unknown or its channel has
    /// closed; that is not an error.
    pub async fn send_to(&self, session_id: &str, event: &str, payload: serde_json::Value) -> bool {
        let sessions = self.sessions.read().await;
        let Some(session) = sessions.get(session_id) else {
            return false;
        };
        let text = RealtimeFrame::new(event, payload).to_text();
        session.sender.send(Message::Text(text.into())).is_ok()
    }

    /// Send an event to every connected session.
    ///
    /// Connections whose channels are closed are skipped (they are cleaned
    /// up when their receive loop ends). Returns how many sessions the
    /// event was handed to.
    pub async fn broadcast(&self, event: &str, payload: serde_json::Value) -> usize {
        let text = RealtimeFrame::new(event, payload).to_text();
        let message = Message::Text(text.into());
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .filter(|s| s.sender.send(message.clone()).is_ok())
            .count()
    }

    /// Whether a session is currently registered.
    pub async fn is_connected(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    /// Return the current number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    pub async fn shutdown_all(&self) {
        let mut sessions = self.sessions.write().await;
        let count = sessions.len();
        for session in sessions.values() {
            let _ = session.sender.send(Message::Close(None));
        }
        sessions.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connection.
    pub async fn ping_all(&self) {
        let sessions = self.sessions.read().await;
        for session in sessions.values() {
            let _ = session.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
