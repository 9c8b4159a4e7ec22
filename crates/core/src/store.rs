//! Record store interface consumed by the orchestration layer.
//!
//! Only two operations are needed: look a drawing up by id, and move its
//! status. The production implementation lives in `draftline-db`.

use async_trait::async_trait;

use crate::drawing::{Drawing, DrawingStatus};
use crate::types::{DbId, Timestamp};

/// Backend failure while reading or writing drawings.
#[derive(Debug, thiserror::Error)]
#[error("Record store unavailable: {0}")]
pub struct StoreError(pub String);

/// Result of a status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    /// The row now holds the new status.
    Applied,
    /// The result came from a job older than the one that last set the
    /// status; nothing was written.
    Stale,
    /// No drawing with that id.
    NotFound,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_by_id(&self, id: DbId) -> Result<Option<Drawing>, StoreError>;

    /// Set the status of drawing `id`.
    ///
    /// When `submitted_at` is given, the write is skipped if the drawing's
    /// status was already set by a job submitted later.
    async fn update_status(
        &self,
        id: DbId,
        status: DrawingStatus,
        submitted_at: Option<Timestamp>,
    ) -> Result<StatusUpdate, StoreError>;
}
