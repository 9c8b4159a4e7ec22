//! Result consumer: drains worker replies and routes them.
//!
//! A `PREVIEW_READY` reply goes to the one session that asked for it and
//! is never persisted. Any other status is written to the record store,
//! and `COMPLETED` is additionally broadcast so every client refreshes.

use std::sync::Arc;

use draftline_core::conversion::{
    ConversionResult, DrawingUpdated, PreviewReady, ResultStatus,
};
use draftline_core::drawing::DrawingStatus;
use draftline_core::queue::{QueueError, ResultDelivery, ResultQueue};
use draftline_core::realtime::{EVENT_DRAWING_UPDATED, EVENT_PREVIEW_READY};
use draftline_core::store::{RecordStore, StatusUpdate, StoreError};
use draftline_core::types::timestamp_from_millis;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::ConsumerConfig;
use crate::ws::ConnectionRegistry;

/// What handling a single result did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Preview handed to its session.
    PreviewDelivered,
    /// The target session is gone. Dropped.
    PreviewMissed,
    /// A preview without a session id. Dropped.
    PreviewUnaddressed,
    /// Status written. `broadcast` is the number of sessions notified.
    StatusApplied {
        status: DrawingStatus,
        broadcast: usize,
    },
    /// A newer job already set the status. Nothing written.
    StaleIgnored,
    /// The drawing no longer exists.
    DrawingMissing,
}

/// Why a result could not be handled.
#[derive(Debug, thiserror::Error)]
pub enum ConsumeError {
    #[error("Malformed result payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Status update failed: {0}")]
    StoreUpdateFailed(#[from] StoreError),
}

impl ConsumeError {
    /// Whether the message should stay on the queue for redelivery.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUpdateFailed(_))
    }
}

pub struct ResultConsumer {
    store: Arc<dyn RecordStore>,
    results: Arc<dyn ResultQueue>,
    registry: Arc<ConnectionRegistry>,
    config: ConsumerConfig,
}

impl ResultConsumer {
    pub fn new(
        store: Arc<dyn RecordStore>,
        results: Arc<dyn ResultQueue>,
        registry: Arc<ConnectionRegistry>,
        config: ConsumerConfig,
    ) -> Self {
        Self {
            store,
            results,
            registry,
            config,
        }
    }

    /// Route one decoded result.
    pub async fn dispatch(&self, result: &ConversionResult) -> Result<Dispatch, ConsumeError> {
        let drawing_id = result.drawing_id;
        match result.status {
            ResultStatus::PreviewReady => {
                let Some(session_id) = result.session_id() else {
                    tracing::warn!(drawing_id, "Preview result without a session id, dropping");
                    return Ok(Dispatch::PreviewUnaddressed);
                };
                let payload = serde_json::to_value(PreviewReady::from(result))?;
                if self
                    .registry
                    .send_to(session_id, EVENT_PREVIEW_READY, payload)
                    .await
                {
                    tracing::debug!(drawing_id, session_id, "Preview delivered");
                    Ok(Dispatch::PreviewDelivered)
                } else {
                    tracing::debug!(drawing_id, session_id, "Session disconnected, preview dropped");
                    Ok(Dispatch::PreviewMissed)
                }
            }

            ResultStatus::StatusChange(status) => {
                let submitted_at = result.start_time.and_then(timestamp_from_millis);
                let update = self
                    .store
                    .update_status(drawing_id, status, submitted_at)
                    .await?;

                match update {
                    StatusUpdate::Applied => {
                        let broadcast = if status == DrawingStatus::Completed {
                            let payload = serde_json::to_value(DrawingUpdated { id: drawing_id })?;
                            self.registry.broadcast(EVENT_DRAWING_UPDATED, payload).await
                        } else {
                            0
                        };
                        tracing::info!(drawing_id, %status, broadcast, "Drawing status updated");
                        Ok(Dispatch::StatusApplied { status, broadcast })
                    }
                    StatusUpdate::Stale => {
                        tracing::info!(drawing_id, %status, "Stale result ignored");
                        Ok(Dispatch::StaleIgnored)
                    }
                    StatusUpdate::NotFound => {
                        tracing::warn!(drawing_id, %status, "Result for unknown drawing");
                        Ok(Dispatch::DrawingMissing)
                    }
                }
            }
        }
    }

    /// Decode and route a raw payload.
    pub async fn process(&self, payload: &serde_json::Value) -> Result<Dispatch, ConsumeError> {
        let result = ConversionResult::from_payload(payload)?;
        self.dispatch(&result).await
    }

    /// Handle one claimed message, then ack or release it.
    ///
    /// Malformed payloads are acked so they never block the queue. A store
    /// failure releases the message for a later attempt.
    pub async fn handle_delivery(&self, delivery: ResultDelivery) -> Result<Dispatch, ConsumeError> {
        let outcome = self.process(&delivery.payload).await;

        let settle = match &outcome {
            Ok(_) => self.results.ack(delivery.id).await,
            Err(e) if e.is_retryable() => {
                tracing::error!(
                    delivery_id = delivery.id,
                    attempts = delivery.attempts,
                    error = %e,
                    "Result handling failed, releasing for redelivery",
                );
                self.results.release(delivery.id).await
            }
            Err(e) => {
                tracing::warn!(
                    delivery_id = delivery.id,
                    payload = %delivery.payload,
                    error = %e,
                    "Dropping malformed result",
                );
                self.results.ack(delivery.id).await
            }
        };

        if let Err(e) = settle {
            tracing::error!(delivery_id = delivery.id, error = %e, "Failed to settle result message");
        }

        outcome
    }

    /// Handle every currently visible message in order. Returns how many
    /// messages were handled.
    pub async fn drain(&self) -> Result<usize, QueueError> {
        let mut handled = 0;
        while let Some(delivery) = self.results.receive().await? {
            let _ = self.handle_delivery(delivery).await;
            handled += 1;
        }
        Ok(handled)
    }

    /// Run the consumer loop until `cancel` fires.
    ///
    /// Each message is handled on its own task, at most
    /// `config.concurrency` at once. In-flight tasks finish before this
    /// returns.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let tracker = TaskTracker::new();

        tracing::info!(
            concurrency = self.config.concurrency,
            poll_ms = self.config.poll_interval.as_millis() as u64,
            "Result consumer started",
        );

        loop {
            let permit = tokio::select! {
                _ = cancel.cancelled() => break,
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let next = tokio::select! {
                _ = cancel.cancelled() => break,
                next = self.results.receive() => next,
            };

            match next {
                Ok(Some(delivery)) => {
                    let consumer = Arc::clone(&self);
                    tracker.spawn(async move {
                        let _permit = permit;
                        let _ = consumer.handle_delivery(delivery).await;
                    });
                }
                Ok(None) => {
                    drop(permit);
                    self.idle(&cancel).await;
                }
                Err(e) => {
                    drop(permit);
                    tracing::error!(error = %e, "Failed to poll result queue");
                    self.idle(&cancel).await;
                }
            }
        }

        tracker.close();
        tracker.wait().await;
        tracing::info!("Result consumer stopped");
    }

    async fn idle(&self, cancel: &CancellationToken) {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(self.config.poll_interval) => {}
        }
    }
}
