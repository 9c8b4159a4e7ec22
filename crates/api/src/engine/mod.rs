//! Conversion orchestration: job submission and result consumption.

pub mod consumer;
pub mod submitter;

pub use consumer::{ConsumeError, Dispatch, ResultConsumer};
pub use submitter::{JobHandle, JobSubmitter, SubmitError};
