//! Dedup key policy for queued conversion jobs.
//!
//! The queue treats two jobs with the same key as the same logical job:
//! while one is still waiting, a second enqueue with that key replaces it
//! instead of adding another. The strategy chosen here decides whether
//! interactive parameter changes collapse or accumulate.

use std::str::FromStr;

use crate::conversion::ConversionJob;
use crate::error::CoreError;

/// How the dedup key of a job is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobKeyStrategy {
    /// `"{MODE}-{drawingId}"`: at most one waiting job per mode and drawing.
    #[default]
    PerEntity,
    /// `"{MODE}-{drawingId}-{startTimeMs}"`: one job per submission.
    PerSubmission,
}

impl JobKeyStrategy {
    /// Compute the dedup key for `job`.
    pub fn key_for(self, job: &ConversionJob) -> String {
        match self {
            Self::PerEntity => format!("{}-{}", job.mode, job.drawing_id),
            Self::PerSubmission => {
                format!("{}-{}-{}", job.mode, job.drawing_id, job.start_time_ms())
            }
        }
    }

    /// Whether rapid resubmissions for the same mode and drawing collapse.
    pub fn collapses(self) -> bool {
        matches!(self, Self::PerEntity)
    }
}

impl FromStr for JobKeyStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per_entity" => Ok(Self::PerEntity),
            "per_submission" => Ok(Self::PerSubmission),
            other => Err(CoreError::Validation(format!(
                "Unknown job key strategy '{other}'. Must be one of: per_entity, per_submission"
            ))),
        }
    }
}
