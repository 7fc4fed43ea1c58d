//! # Huddle Server
//!
//! Realtime room presence hub. Clients connect over WebSocket, register into
//! a room and receive that room's member list whenever it changes and on a
//! fixed refresh interval.

pub mod config;
pub mod handlers;
pub mod metrics;

pub use config::Config;
pub use handlers::{run_server, serve};
