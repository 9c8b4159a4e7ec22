use std::sync::Arc;

use crate::config::ServerConfig;
use crate::engine::JobSubmitter;
use crate::storage::UploadStore;
use crate::ws::ConnectionRegistry;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is a pool handle or behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: draftline_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Live realtime connections.
    pub registry: Arc<ConnectionRegistry>,
    /// Shared by the HTTP submission routes and every realtime session.
    pub submitter: Arc<JobSubmitter>,
    /// Where uploaded drawings are written.
    pub uploads: Arc<UploadStore>,
}
