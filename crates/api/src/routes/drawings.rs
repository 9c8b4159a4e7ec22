//! Route definitions for the `/drawings` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::drawings;
use crate::state::AppState;

/// Routes mounted at `/drawings`.
///
/// ```text
/// GET    /                    -> list_drawings
/// POST   /upload              -> upload_drawing
/// GET    /{id}                -> get_drawing
/// POST   /{id}/conversions    -> submit_conversion
/// ```
///
/// Uploads accept bodies up to `upload_max_bytes`.
pub fn router(upload_max_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(drawings::list_drawings))
        .route(
            "/upload",
            post(drawings::upload_drawing).layer(DefaultBodyLimit::max(upload_max_bytes)),
        )
        .route("/{id}", get(drawings::get_drawing))
        .route("/{id}/conversions", post(drawings::submit_conversion))
}
