//! Row models and DTOs.

pub mod drawing;
pub mod queue;
