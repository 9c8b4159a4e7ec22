//! Inbound realtime events.

use std::sync::Arc;

use draftline_core::realtime::{RealtimeFrame, EVENT_ADJUST_PARAMETERS};
use draftline_core::types::DbId;
use serde_json::Value;

use crate::engine::{JobHandle, JobSubmitter, SubmitError};

/// Why an inbound adjustment produced no job.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Malformed adjustment: {0}")]
    Malformed(String),

    #[error(transparent)]
    Submit(#[from] SubmitError),
}

/// Turns `adjustParameters` events into job submissions addressed back to
/// the sending session.
#[derive(Clone)]
pub struct RealtimeInputChannel {
    submitter: Arc<JobSubmitter>,
}

impl RealtimeInputChannel {
    pub fn new(submitter: Arc<JobSubmitter>) -> Self {
        Self { submitter }
    }

    /// Handle one inbound text frame from `session_id`.
    ///
    /// Never fails: bad frames and failed submissions are logged so the
    /// connection stays open.
    pub async fn handle_text(&self, session_id: &str, text: &str) {
        let frame = match RealtimeFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(session_id, error = %e, "Ignoring unparseable frame");
                return;
            }
        };

        if frame.event != EVENT_ADJUST_PARAMETERS {
            tracing::debug!(session_id, event = %frame.event, "Ignoring unknown event");
            return;
        }

        match self.adjust_parameters(session_id, frame.data).await {
            Ok(_) => {}
            Err(InputError::Malformed(reason)) => {
                tracing::warn!(session_id, %reason, "Ignoring malformed adjustment");
            }
            // Already logged by the submitter.
            Err(InputError::Submit(_)) => {}
        }
    }

    /// Submit one adjustment. `data` is `{drawingId, ...params}`.
    ///
    /// The sending session id is written into the params, replacing any
    /// `sessionId` the client supplied.
    pub async fn adjust_parameters(
        &self,
        session_id: &str,
        data: Value,
    ) -> Result<JobHandle, InputError> {
        let Value::Object(mut params) = data else {
            return Err(InputError::Malformed("data must be an object".into()));
        };

        let drawing_id = params
            .remove("drawingId")
            .as_ref()
            .and_then(parse_drawing_id)
            .ok_or_else(|| InputError::Malformed("missing or invalid drawingId".into()))?;

        params.insert("sessionId".into(), Value::from(session_id));
        Ok(self.submitter.submit(drawing_id, params).await?)
    }
}

/// Accept a drawing id sent as a JSON integer or a numeric string.
fn parse_drawing_id(value: &Value) -> Option<DbId> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
