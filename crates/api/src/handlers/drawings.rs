//! Handlers for the `/drawings` resource.

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use draftline_core::conversion::{JobMode, JobParams};
use draftline_core::drawing::Drawing;
use draftline_core::error::CoreError;
use draftline_core::types::DbId;
use draftline_db::models::drawing::CreateDrawing;
use draftline_db::repositories::DrawingRepo;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Multipart field carrying the uploaded image.
const UPLOAD_FIELD: &str = "file";

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

/// Map a multipart read failure, keeping the body-limit case distinct.
fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

/// POST /api/v1/drawings/upload
///
/// Store the uploaded file, create a `PENDING` drawing, and queue a final
/// conversion for it. Returns 201 with the drawing. If the queue is down
/// the drawing is kept and the request fails with 503.
pub async fn upload_drawing(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(multipart_error)?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| AppError::BadRequest(format!("Missing '{UPLOAD_FIELD}' field")))?;

    let original_url = state.uploads.save(&file_name, &bytes).await?;
    let drawing = DrawingRepo::create(
        &state.pool,
        &CreateDrawing {
            file_name,
            original_url,
        },
    )
    .await?
    .into_drawing()?;

    tracing::info!(drawing_id = drawing.id, file_name = %drawing.file_name, "Drawing uploaded");

    let mut params = JobParams::new();
    params.insert("mode".into(), Value::from(JobMode::Final.as_str()));
    state.submitter.submit(drawing.id, params).await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: drawing })))
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// GET /api/v1/drawings
///
/// All drawings, newest first.
pub async fn list_drawings(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let drawings = DrawingRepo::list(&state.pool)
        .await?
        .into_iter()
        .map(|row| row.into_drawing())
        .collect::<Result<Vec<Drawing>, CoreError>>()?;

    Ok(Json(DataResponse { data: drawings }))
}

/// GET /api/v1/drawings/{id}
pub async fn get_drawing(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let drawing = DrawingRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Drawing",
            id,
        }))?
        .into_drawing()?;

    Ok(Json(DataResponse { data: drawing }))
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// POST /api/v1/drawings/{id}/conversions
///
/// Queue a conversion with the given tuning parameters. Returns 202 with
/// the job handle.
pub async fn submit_conversion(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(params): Json<JobParams>,
) -> AppResult<impl IntoResponse> {
    let handle = state.submitter.submit(id, params).await?;
    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: handle })))
}
