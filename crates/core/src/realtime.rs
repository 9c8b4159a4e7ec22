//! Realtime event names and the WebSocket frame envelope.
//!
//! Every text frame is `{"event": <name>, "data": <payload>}` in both
//! directions.

use serde::{Deserialize, Serialize};

/// Sent once to a new connection with its session id.
pub const EVENT_CONNECTED: &str = "connected";

/// Inbound: client adjusts conversion parameters for a drawing.
pub const EVENT_ADJUST_PARAMETERS: &str = "adjustParameters";

/// Outbound, targeted: a preview for the session's last adjustment.
pub const EVENT_PREVIEW_READY: &str = "previewReady";

/// Outbound, broadcast: a drawing reached `COMPLETED`; clients refresh.
pub const EVENT_DRAWING_UPDATED: &str = "drawingUpdated";

/// Envelope for a realtime frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeFrame {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl RealtimeFrame {
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Serialize to the text sent over the socket.
    pub fn to_text(&self) -> String {
        // Serializing a String and a Value cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parse an inbound text frame.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
