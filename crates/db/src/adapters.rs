//! PostgreSQL implementations of the core collaborator traits.

use std::time::Duration;

use async_trait::async_trait;
use draftline_core::drawing::{Drawing, DrawingStatus};
use draftline_core::queue::{
    EnqueueOutcome, JobQueue, QueueError, QueuedJob, ResultDelivery, ResultQueue,
};
use draftline_core::store::{RecordStore, StatusUpdate, StoreError};
use draftline_core::types::{DbId, Timestamp};

use crate::repositories::{ConversionJobRepo, ConversionResultRepo, DrawingRepo};
use crate::DbPool;

/// Default time a claimed result stays hidden before redelivery.
pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay before a released result becomes visible again.
pub const RELEASE_BACKOFF: Duration = Duration::from_secs(5);

fn store_error(err: impl std::fmt::Display) -> StoreError {
    StoreError(err.to_string())
}

fn queue_error(err: sqlx::Error) -> QueueError {
    QueueError(err.to_string())
}

// ---------------------------------------------------------------------------
// RecordStore
// ---------------------------------------------------------------------------

/// [`RecordStore`] over the `drawings` table.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: DbPool,
}

impl PgRecordStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find_by_id(&self, id: DbId) -> Result<Option<Drawing>, StoreError> {
        let row = DrawingRepo::find_by_id(&self.pool, id)
            .await
            .map_err(store_error)?;
        row.map(|r| r.into_drawing().map_err(store_error))
            .transpose()
    }

    async fn update_status(
        &self,
        id: DbId,
        status: DrawingStatus,
        submitted_at: Option<Timestamp>,
    ) -> Result<StatusUpdate, StoreError> {
        DrawingRepo::update_status(&self.pool, id, status, submitted_at)
            .await
            .map_err(store_error)
    }
}

// ---------------------------------------------------------------------------
// JobQueue
// ---------------------------------------------------------------------------

/// [`JobQueue`] over the `conversion_jobs` table.
#[derive(Clone)]
pub struct PgJobQueue {
    pool: DbPool,
}

impl PgJobQueue {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobQueue for PgJobQueue {
    async fn enqueue(&self, job: &QueuedJob) -> Result<EnqueueOutcome, QueueError> {
        let (id, outcome) =
            ConversionJobRepo::enqueue(&self.pool, &job.key, &job.payload, job.remove_on_complete)
                .await
                .map_err(queue_error)?;
        tracing::debug!(queue_job_id = id, job_key = %job.key, ?outcome, "Job enqueued");
        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// ResultQueue
// ---------------------------------------------------------------------------

/// [`ResultQueue`] over the `conversion_results` table.
#[derive(Clone)]
pub struct PgResultQueue {
    pool: DbPool,
    visibility: Duration,
}

impl PgResultQueue {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            visibility: DEFAULT_VISIBILITY_TIMEOUT,
        }
    }

    /// Override how long a claimed message stays hidden.
    pub fn with_visibility(mut self, visibility: Duration) -> Self {
        self.visibility = visibility;
        self
    }
}

#[async_trait]
impl ResultQueue for PgResultQueue {
    async fn receive(&self) -> Result<Option<ResultDelivery>, QueueError> {
        let row = ConversionResultRepo::claim_next(&self.pool, self.visibility)
            .await
            .map_err(queue_error)?;
        Ok(row.map(|r| ResultDelivery {
            id: r.id,
            payload: r.payload,
            attempts: r.attempts,
        }))
    }

    async fn ack(&self, delivery_id: DbId) -> Result<(), QueueError> {
        ConversionResultRepo::delete(&self.pool, delivery_id)
            .await
            .map_err(queue_error)
    }

    async fn release(&self, delivery_id: DbId) -> Result<(), QueueError> {
        ConversionResultRepo::release(&self.pool, delivery_id, RELEASE_BACKOFF)
            .await
            .map_err(queue_error)
    }
}
