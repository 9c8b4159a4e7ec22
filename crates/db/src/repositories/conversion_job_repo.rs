//! Repository for the `conversion_jobs` queue table.
//!
//! Dedup is enforced by the partial unique index on `job_key` over waiting
//! rows: enqueueing a key that is already waiting replaces that row's
//! payload and keeps its queue position. Once a worker claims a job, the
//! key is free again.

use draftline_core::queue::EnqueueOutcome;
use draftline_core::types::DbId;
use sqlx::PgPool;

use crate::models::queue::{ConversionJobRow, ConversionJobStatus};

/// Column list for `conversion_jobs` queries.
const COLUMNS: &str = "\
    id, job_key, payload, status_id, remove_on_complete, \
    enqueued_at, claimed_at, finished_at";

/// Provides enqueue, claim and completion for conversion jobs.
pub struct ConversionJobRepo;

impl ConversionJobRepo {
    /// Add a waiting job, or replace the payload of the waiting job that
    /// already holds `job_key`.
    pub async fn enqueue(
        pool: &PgPool,
        job_key: &str,
        payload: &serde_json::Value,
        remove_on_complete: bool,
    ) -> Result<(DbId, EnqueueOutcome), sqlx::Error> {
        // `xmax = 0` is true only for freshly inserted tuples.
        let (id, inserted) = sqlx::query_as::<_, (DbId, bool)>(
            "INSERT INTO conversion_jobs (job_key, payload, status_id, remove_on_complete) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (job_key) WHERE status_id = 1 \
             DO UPDATE SET payload = EXCLUDED.payload, \
                           remove_on_complete = EXCLUDED.remove_on_complete \
             RETURNING id, (xmax = 0) AS inserted",
        )
        .bind(job_key)
        .bind(payload)
        .bind(ConversionJobStatus::Waiting.id())
        .bind(remove_on_complete)
        .fetch_one(pool)
        .await?;

        let outcome = if inserted {
            EnqueueOutcome::Created
        } else {
            EnqueueOutcome::Replaced
        };
        Ok((id, outcome))
    }

    /// Atomically claim the oldest waiting job.
    ///
    /// Uses `SELECT FOR UPDATE SKIP LOCKED` so concurrent workers never
    /// receive the same job.
    pub async fn claim_next(pool: &PgPool) -> Result<Option<ConversionJobRow>, sqlx::Error> {
        let query = format!(
            "UPDATE conversion_jobs \
             SET status_id = $1, claimed_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM conversion_jobs \
                 WHERE status_id = $2 \
                 ORDER BY enqueued_at ASC, id ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ConversionJobRow>(&query)
            .bind(ConversionJobStatus::Active.id())
            .bind(ConversionJobStatus::Waiting.id())
            .fetch_optional(pool)
            .await
    }

    /// Finish a claimed job. Successful jobs flagged `remove_on_complete`
    /// are deleted; everything else keeps its row with a terminal status.
    pub async fn finish(pool: &PgPool, id: DbId, succeeded: bool) -> Result<(), sqlx::Error> {
        if succeeded {
            let removed = sqlx::query(
                "DELETE FROM conversion_jobs WHERE id = $1 AND remove_on_complete",
            )
            .bind(id)
            .execute(pool)
            .await?;
            if removed.rows_affected() > 0 {
                return Ok(());
            }
        }

        let status = if succeeded {
            ConversionJobStatus::Completed
        } else {
            ConversionJobStatus::Failed
        };
        sqlx::query(
            "UPDATE conversion_jobs SET status_id = $2, finished_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status.id())
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ConversionJobRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM conversion_jobs WHERE id = $1");
        sqlx::query_as::<_, ConversionJobRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Waiting and active jobs for a key, oldest first.
    pub async fn list_live_by_key(
        pool: &PgPool,
        job_key: &str,
    ) -> Result<Vec<ConversionJobRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM conversion_jobs \
             WHERE job_key = $1 AND status_id IN ($2, $3) \
             ORDER BY enqueued_at ASC, id ASC"
        );
        sqlx::query_as::<_, ConversionJobRow>(&query)
            .bind(job_key)
            .bind(ConversionJobStatus::Waiting.id())
            .bind(ConversionJobStatus::Active.id())
            .fetch_all(pool)
            .await
    }
}
