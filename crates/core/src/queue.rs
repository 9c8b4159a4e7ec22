//! Durable queue interfaces.
//!
//! [`JobQueue`] carries work to the external worker; [`ResultQueue`] brings
//! its replies back. Both are at-least-once: a result that is not
//! acknowledged will be delivered again.

use async_trait::async_trait;

use crate::types::DbId;

/// Queue backend failure.
#[derive(Debug, thiserror::Error)]
#[error("Queue unavailable: {0}")]
pub struct QueueError(pub String);

/// A job ready to enqueue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedJob {
    /// Dedup key. A waiting job with the same key is replaced.
    pub key: String,
    pub payload: serde_json::Value,
    /// Drop the queue record once the worker completes the job.
    pub remove_on_complete: bool,
}

/// What an enqueue did to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// A new waiting job was added.
    Created,
    /// A waiting job with the same key was superseded by this payload.
    Replaced,
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: &QueuedJob) -> Result<EnqueueOutcome, QueueError>;
}

/// A result message claimed from the result queue.
#[derive(Debug, Clone)]
pub struct ResultDelivery {
    /// Queue-assigned id, used to ack or release.
    pub id: DbId,
    /// Raw message body. May be malformed.
    pub payload: serde_json::Value,
    /// How many times this message has been claimed, including this one.
    pub attempts: i32,
}

#[async_trait]
pub trait ResultQueue: Send + Sync {
    /// Claim the next visible message, or `None` if the queue is empty.
    async fn receive(&self) -> Result<Option<ResultDelivery>, QueueError>;

    /// Remove a handled message.
    async fn ack(&self, delivery_id: DbId) -> Result<(), QueueError>;

    /// Give a message back for later redelivery.
    async fn release(&self, delivery_id: DbId) -> Result<(), QueueError>;
}
