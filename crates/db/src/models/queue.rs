//! Queue row models.

use draftline_core::define_status_enum;
use draftline_core::status::StatusId;
use draftline_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// Status ID type for the `conversion_job_statuses` lookup table.
pub type JobStatusId = StatusId;

define_status_enum! {
    /// Lifecycle of a row in `conversion_jobs`.
    ConversionJobStatus {
        Waiting = 1,
        Active = 2,
        Completed = 3,
        Failed = 4,
    }
}

/// A row from the `conversion_jobs` table.
#[derive(Debug, Clone, FromRow)]
pub struct ConversionJobRow {
    pub id: DbId,
    pub job_key: String,
    pub payload: serde_json::Value,
    pub status_id: JobStatusId,
    pub remove_on_complete: bool,
    pub enqueued_at: Timestamp,
    pub claimed_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
}

/// A claimed row from the `conversion_results` table.
#[derive(Debug, Clone, FromRow)]
pub struct ConversionResultRow {
    pub id: DbId,
    pub payload: serde_json::Value,
    pub attempts: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_ids_match_seed_data() {
        assert_eq!(ConversionJobStatus::Waiting.id(), 1);
        assert_eq!(ConversionJobStatus::Active.id(), 2);
        assert_eq!(ConversionJobStatus::Completed.id(), 3);
        assert_eq!(ConversionJobStatus::Failed.id(), 4);
    }
}
