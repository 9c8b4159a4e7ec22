//! Drawing row model and DTOs.

use draftline_core::drawing::{Drawing, DrawingStatus, StatusId};
use draftline_core::error::CoreError;
use draftline_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `drawings` table.
#[derive(Debug, Clone, FromRow)]
pub struct DrawingRow {
    pub id: DbId,
    pub file_name: String,
    pub original_url: String,
    pub status_id: StatusId,
    pub status_job_started_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DrawingRow {
    /// Convert into the domain entity, resolving the status lookup id.
    pub fn into_drawing(self) -> Result<Drawing, CoreError> {
        Ok(Drawing {
            id: self.id,
            file_name: self.file_name,
            original_url: self.original_url,
            status: DrawingStatus::from_id(self.status_id)?,
            created_at: self.created_at,
        })
    }
}

/// DTO for recording an accepted upload.
#[derive(Debug, Clone)]
pub struct CreateDrawing {
    pub file_name: String,
    pub original_url: String,
}
