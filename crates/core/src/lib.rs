//! Shared domain types for the drawing conversion service.
//!
//! Holds the drawing entity, the job and result message shapes exchanged
//! with the external worker, the dedup-key policy, realtime event names,
//! and the collaborator traits implemented by the database crate.

pub mod conversion;
pub mod drawing;
pub mod error;
pub mod job_key;
pub mod queue;
pub mod realtime;
pub mod status;
pub mod store;
pub mod types;
