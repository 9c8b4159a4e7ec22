//! Job submission: turn a client request into one queued conversion job.

use std::sync::Arc;

use draftline_core::conversion::{ConversionJob, JobParams};
use draftline_core::job_key::JobKeyStrategy;
use draftline_core::queue::{EnqueueOutcome, JobQueue, QueueError, QueuedJob};
use draftline_core::store::{RecordStore, StoreError};
use draftline_core::types::{DbId, Timestamp};
use serde::Serialize;

/// Why a submission did not produce a queued job.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// No drawing with this id. Nothing was enqueued.
    #[error("Drawing {0} not found")]
    EntityNotFound(DbId),

    /// The drawing lookup itself failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The queue rejected the job. Not retried here.
    #[error(transparent)]
    EnqueueFailed(#[from] QueueError),
}

/// Receipt for a queued job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobHandle {
    pub job_key: String,
    pub drawing_id: DbId,
    pub mode: String,
    pub submitted_at: Timestamp,
    /// A waiting job with the same key was superseded.
    pub replaced: bool,
}

/// Builds conversion jobs and hands them to the [`JobQueue`].
pub struct JobSubmitter {
    store: Arc<dyn RecordStore>,
    queue: Arc<dyn JobQueue>,
    key_strategy: JobKeyStrategy,
}

impl JobSubmitter {
    pub fn new(
        store: Arc<dyn RecordStore>,
        queue: Arc<dyn JobQueue>,
        key_strategy: JobKeyStrategy,
    ) -> Self {
        Self {
            store,
            queue,
            key_strategy,
        }
    }

    /// Submit a conversion job for `drawing_id`.
    ///
    /// Makes exactly one enqueue attempt when the drawing exists and none
    /// when it does not. The job always carries the drawing's stored
    /// location, never one supplied in `params`.
    pub async fn submit(&self, drawing_id: DbId, params: JobParams) -> Result<JobHandle, SubmitError> {
        let Some(drawing) = self.store.find_by_id(drawing_id).await? else {
            tracing::warn!(drawing_id, "Conversion requested for unknown drawing, skipping");
            return Err(SubmitError::EntityNotFound(drawing_id));
        };

        let job = ConversionJob::build(&drawing, params, chrono::Utc::now());
        let key = self.key_strategy.key_for(&job);
        let queued = QueuedJob {
            key: key.clone(),
            payload: job.to_payload(),
            remove_on_complete: true,
        };

        let outcome = match self.queue.enqueue(&queued).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(drawing_id, job_key = %key, error = %e, "Failed to enqueue conversion job");
                return Err(SubmitError::EnqueueFailed(e));
            }
        };

        let replaced = outcome == EnqueueOutcome::Replaced;
        tracing::info!(
            drawing_id,
            job_key = %key,
            mode = %job.mode,
            session_id = job.session_id.as_deref().unwrap_or(""),
            replaced,
            "Conversion job queued",
        );

        Ok(JobHandle {
            job_key: key,
            drawing_id,
            mode: job.mode.to_string(),
            submitted_at: job.submitted_at,
            replaced,
        })
    }
}
