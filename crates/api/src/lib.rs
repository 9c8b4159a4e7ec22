//! HTTP and realtime front end for drawing conversion.
//!
//! Submits conversion jobs to the durable job queue, consumes worker
//! results, and pushes previews and status changes to connected clients.

pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod storage;
pub mod ws;
