//! Drawing entity and its status lifecycle.
//!
//! A drawing is the persisted record of one user-submitted conversion
//! request. Its status moves `PENDING -> PROCESSING -> COMPLETED | FAILED`
//! as results arrive from the external worker.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

pub use crate::status::StatusId;

crate::define_status_enum! {
    /// Drawing processing status.
    ///
    /// Discriminants match the seed order of the `drawing_statuses` table.
    DrawingStatus {
        Pending = 1,
        Processing = 2,
        Completed = 3,
        Failed = 4,
    }
}

impl DrawingStatus {
    /// Resolve a database status ID.
    pub fn from_id(id: StatusId) -> Result<Self, CoreError> {
        match id {
            1 => Ok(Self::Pending),
            2 => Ok(Self::Processing),
            3 => Ok(Self::Completed),
            4 => Ok(Self::Failed),
            other => Err(CoreError::Validation(format!(
                "Unknown drawing status id {other}"
            ))),
        }
    }

    /// Whether no further worker progress is expected.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Wire name used in queue messages and API responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for DrawingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrawingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            other => Err(CoreError::Validation(format!(
                "Unknown drawing status '{other}'"
            ))),
        }
    }
}

impl Serialize for DrawingStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DrawingStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A drawing as seen by the orchestration layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Drawing {
    pub id: DbId,
    pub file_name: String,
    /// Location of the uploaded source image; becomes the job's `filePath`.
    pub original_url: String,
    pub status: DrawingStatus,
    pub created_at: Timestamp,
}
