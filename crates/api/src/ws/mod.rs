//! WebSocket infrastructure for the realtime channel.
//!
//! Provides the connection registry, the inbound event handler, heartbeat
//! pings, and the HTTP upgrade handler used by Axum routes.

mod handler;
mod heartbeat;
pub mod input;
pub mod registry;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use input::{InputError, RealtimeInputChannel};
pub use registry::ConnectionRegistry;
