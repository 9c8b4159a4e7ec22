pub mod drawings;
pub mod health;

use axum::routing::get;
use axum::Router;

use crate::config::ServerConfig;
use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws                                 WebSocket (realtime channel)
/// /drawings                           list
/// /drawings/upload                    upload (POST, multipart)
/// /drawings/{id}                      get
/// /drawings/{id}/conversions          submit conversion (POST)
/// ```
pub fn api_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/drawings", drawings::router(config.upload_max_bytes))
}
