//! # huddle-protocol
//!
//! Wire formats for the Huddle presence hub.
//!
//! Two layers live here:
//!
//! - **Envelopes** - every message on the socket is a named event carrying a
//!   flat string (`{"event": "register", "data": "lobby,b1,alice"}`), framed
//!   as JSON.
//! - **Payloads** - the comma-delimited command payloads sent by clients and
//!   the backtick/pipe room encoding sent back by the server.
//!
//! ## Example
//!
//! ```rust
//! use huddle_protocol::{encode_room, Command, Member};
//!
//! let command = Command::parse("register", "lobby,b1,alice").unwrap();
//! assert_eq!(command.room_id(), "lobby");
//!
//! let members = [Member::new("b1", "alice")];
//! assert_eq!(encode_room(&members), "b1`alice`0|");
//! ```

pub mod codec;
pub mod command;
pub mod frames;
pub mod room;

pub use codec::ProtocolError;
pub use command::{decode_fields, missing_fields, Command, RegisterCommand, ZapCommand};
pub use frames::{Envelope, EventKind};
pub use room::{decode_room, encode_room, Member};
