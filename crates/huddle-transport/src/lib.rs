//! # huddle-transport
//!
//! Connection abstraction for the Huddle presence hub.
//!
//! Connections exchange [`Envelope`](huddle_protocol::Envelope)s. The server
//! loop only sees the [`Connection`] trait, so it does not care how frames
//! are carried.
//!
//! ```rust,ignore
//! use huddle_transport::Connection;
//!
//! async fn pump(mut conn: impl Connection) {
//!     while let Ok(Some(envelope)) = conn.recv().await {
//!         // Hand the event to the hub
//!     }
//! }
//! ```

pub mod traits;
pub mod websocket;

pub use traits::{Connection, TransportError};
pub use websocket::WebSocketConnection;
