//! Queue message shapes exchanged with the external conversion worker.
//!
//! Outbound jobs go to the `drawing-conversion` queue; worker replies come
//! back on `drawing-results`. Both are JSON objects with camelCase keys.
//! The tuning parameters inside a job are an open set and pass through
//! untouched.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::drawing::{Drawing, DrawingStatus};
use crate::types::{DbId, Timestamp};

/// Queue the external worker consumes jobs from.
pub const JOB_QUEUE_NAME: &str = "drawing-conversion";

/// Queue the external worker publishes results to.
pub const RESULT_QUEUE_NAME: &str = "drawing-results";

/// Result status marking a transient, targeted preview.
pub const STATUS_PREVIEW_READY: &str = "PREVIEW_READY";

/// Open key/value bag of tuning parameters.
pub type JobParams = Map<String, Value>;

// ---------------------------------------------------------------------------
// JobMode
// ---------------------------------------------------------------------------

/// Job variant. Preview jobs are cheap and answered to one session; final
/// jobs end in a persisted status change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JobMode {
    Preview,
    Final,
    /// Any other mode string a client sends. Passed through verbatim.
    Custom(String),
}

impl JobMode {
    /// Resolve the `mode` parameter. A missing or non-string mode is the
    /// legacy default, which behaves as [`JobMode::Final`].
    pub fn from_param(raw: Option<&Value>) -> Self {
        match raw.and_then(Value::as_str) {
            None => Self::Final,
            Some(s) if s.eq_ignore_ascii_case("PREVIEW") => Self::Preview,
            Some(s) if s.eq_ignore_ascii_case("FINAL") => Self::Final,
            Some(s) => Self::Custom(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Preview => "PREVIEW",
            Self::Final => "FINAL",
            Self::Custom(s) => s,
        }
    }
}

impl fmt::Display for JobMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ConversionJob
// ---------------------------------------------------------------------------

/// A unit of work for the external worker.
///
/// Carries everything the worker needs so it never has to query the
/// record store.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionJob {
    pub drawing_id: DbId,
    pub file_path: String,
    /// Submission time, echoed back by the worker as `startTime`.
    pub submitted_at: Timestamp,
    pub mode: JobMode,
    pub session_id: Option<String>,
    /// Remaining tuning parameters, opaque to this service.
    pub params: JobParams,
}

impl ConversionJob {
    /// Build a job for `drawing` from a client parameter bag.
    ///
    /// `mode` and `sessionId` are lifted out of `params`; the stored file
    /// location and drawing id always come from the record, never from
    /// the client.
    pub fn build(drawing: &Drawing, mut params: JobParams, submitted_at: Timestamp) -> Self {
        let mode = JobMode::from_param(params.get("mode"));
        let session_id = match params.remove("sessionId") {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        };
        for reserved in ["mode", "drawingId", "filePath", "startTime"] {
            params.remove(reserved);
        }

        Self {
            drawing_id: drawing.id,
            file_path: drawing.original_url.clone(),
            submitted_at,
            mode,
            session_id,
            params,
        }
    }

    /// Submission time as epoch milliseconds.
    pub fn start_time_ms(&self) -> i64 {
        self.submitted_at.timestamp_millis()
    }

    /// Render the JSON submission message.
    pub fn to_payload(&self) -> Value {
        let mut payload = self.params.clone();
        payload.insert("drawingId".into(), Value::from(self.drawing_id));
        payload.insert("filePath".into(), Value::from(self.file_path.clone()));
        payload.insert("startTime".into(), Value::from(self.start_time_ms()));
        payload.insert("mode".into(), Value::from(self.mode.as_str()));
        if let Some(session_id) = &self.session_id {
            payload.insert("sessionId".into(), Value::from(session_id.clone()));
        }
        Value::Object(payload)
    }
}

// ---------------------------------------------------------------------------
// ConversionResult
// ---------------------------------------------------------------------------

/// Discriminator of a worker reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    /// Transient preview for one session. Never persisted.
    PreviewReady,
    /// Persisted status transition.
    StatusChange(DrawingStatus),
}

impl<'de> Deserialize<'de> for ResultStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == STATUS_PREVIEW_READY {
            return Ok(Self::PreviewReady);
        }
        raw.parse::<DrawingStatus>()
            .map(Self::StatusChange)
            .map_err(serde::de::Error::custom)
    }
}

/// A reply from the external worker.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub drawing_id: DbId,
    pub status: ResultStatus,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    /// Opaque extraction output, forwarded to the client as-is.
    #[serde(default)]
    pub extracted_dimensions: Option<Value>,
    /// Echo of the job's `startTime` (epoch ms).
    #[serde(default)]
    pub start_time: Option<i64>,
}

impl ConversionResult {
    /// Decode a raw result message.
    pub fn from_payload(payload: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(payload)
    }

    /// Target session, treating an empty string as absent.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|s| !s.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Outbound realtime payloads
// ---------------------------------------------------------------------------

/// Payload of the targeted `previewReady` event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewReady {
    pub drawing_id: DbId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_dimensions: Option<Value>,
}

impl From<&ConversionResult> for PreviewReady {
    fn from(result: &ConversionResult) -> Self {
        Self {
            drawing_id: result.drawing_id,
            preview_url: result.preview_url.clone(),
            extracted_dimensions: result.extracted_dimensions.clone(),
        }
    }
}

/// Payload of the broadcast `drawingUpdated` event.
#[derive(Debug, Clone, Serialize)]
pub struct DrawingUpdated {
    pub id: DbId,
}
