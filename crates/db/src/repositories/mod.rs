//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod conversion_job_repo;
pub mod conversion_result_repo;
pub mod drawing_repo;

pub use conversion_job_repo::ConversionJobRepo;
pub use conversion_result_repo::ConversionResultRepo;
pub use drawing_repo::DrawingRepo;
