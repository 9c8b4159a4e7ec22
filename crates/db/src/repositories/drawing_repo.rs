//! Repository for the `drawings` table.

use draftline_core::drawing::DrawingStatus;
use draftline_core::store::StatusUpdate;
use draftline_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::drawing::{CreateDrawing, DrawingRow};

/// Column list for `drawings` queries.
const COLUMNS: &str = "\
    id, file_name, original_url, status_id, status_job_started_at, \
    created_at, updated_at";

/// Provides read and status-update operations for drawings.
pub struct DrawingRepo;

impl DrawingRepo {
    /// Insert a new drawing in `PENDING` status.
    pub async fn create(pool: &PgPool, input: &CreateDrawing) -> Result<DrawingRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO drawings (file_name, original_url, status_id) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DrawingRow>(&query)
            .bind(&input.file_name)
            .bind(&input.original_url)
            .bind(DrawingStatus::Pending.id())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DrawingRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM drawings WHERE id = $1");
        sqlx::query_as::<_, DrawingRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all drawings, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<DrawingRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM drawings ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, DrawingRow>(&query).fetch_all(pool).await
    }

    /// Set the status of a drawing in a single statement.
    ///
    /// With `submitted_at`, the update only applies when no newer job has
    /// already written the status; `status_job_started_at` then records
    /// `submitted_at`. For the same job, a terminal status (COMPLETED or
    /// FAILED) is never replaced by a non-terminal one. Without
    /// `submitted_at` the update is unconditional.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: DrawingStatus,
        submitted_at: Option<Timestamp>,
    ) -> Result<StatusUpdate, sqlx::Error> {
        let updated = sqlx::query_scalar::<_, DbId>(
            "UPDATE drawings \
             SET status_id = $2, \
                 status_job_started_at = COALESCE($3, status_job_started_at), \
                 updated_at = NOW() \
             WHERE id = $1 \
               AND ($3::TIMESTAMPTZ IS NULL \
                    OR status_job_started_at IS NULL \
                    OR status_job_started_at < $3 \
                    OR (status_job_started_at = $3 \
                        AND ($4 OR status_id NOT IN ($5, $6)))) \
             RETURNING id",
        )
        .bind(id)
        .bind(status.id())
        .bind(submitted_at)
        .bind(status.is_terminal())
        .bind(DrawingStatus::Completed.id())
        .bind(DrawingStatus::Failed.id())
        .fetch_optional(pool)
        .await?;

        if updated.is_some() {
            return Ok(StatusUpdate::Applied);
        }

        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM drawings WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;

        Ok(if exists {
            StatusUpdate::Stale
        } else {
            StatusUpdate::NotFound
        })
    }
}
