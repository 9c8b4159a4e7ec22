//! Repository for the `conversion_results` queue table.
//!
//! A claimed message stays in the table with `visible_at` pushed into the
//! future. If it is never acknowledged it becomes visible again and is
//! redelivered.

use std::time::Duration;

use draftline_core::types::DbId;
use sqlx::PgPool;

use crate::models::queue::ConversionResultRow;

/// Provides publish, claim, ack and release for worker results.
pub struct ConversionResultRepo;

impl ConversionResultRepo {
    /// Append a result message. Used by the worker side and by tests.
    pub async fn publish(pool: &PgPool, payload: &serde_json::Value) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO conversion_results (payload) VALUES ($1) RETURNING id",
        )
        .bind(payload)
        .fetch_one(pool)
        .await
    }

    /// Claim the oldest visible message and hide it for `visibility`.
    pub async fn claim_next(
        pool: &PgPool,
        visibility: Duration,
    ) -> Result<Option<ConversionResultRow>, sqlx::Error> {
        sqlx::query_as::<_, ConversionResultRow>(
            "UPDATE conversion_results \
             SET attempts = attempts + 1, \
                 visible_at = NOW() + make_interval(secs => $1) \
             WHERE id = ( \
                 SELECT id FROM conversion_results \
                 WHERE visible_at <= NOW() \
                 ORDER BY id ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING id, payload, attempts",
        )
        .bind(visibility.as_secs_f64())
        .fetch_optional(pool)
        .await
    }

    /// Remove a handled message.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM conversion_results WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Make a claimed message visible again after `delay`.
    pub async fn release(pool: &PgPool, id: DbId, delay: Duration) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE conversion_results \
             SET visible_at = NOW() + make_interval(secs => $2) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(delay.as_secs_f64())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Number of messages still in the table, visible or not.
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM conversion_results")
            .fetch_one(pool)
            .await
    }
}
