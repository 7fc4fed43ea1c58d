//! # huddle-core
//!
//! Room membership state and its fan-out for the Huddle presence hub.
//!
//! - **Registry** - rooms and their ordered member records
//! - **SessionRouter** - turns client events into registry mutations and
//!   room broadcasts
//! - **Scheduler** - periodic re-broadcast of every room
//! - **Fanout** - room-scoped delivery to connected sessions
//! - **Hub** - single task owning the router, so every event and tick runs
//!   to completion before the next one starts
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐  events   ┌─────────────────────────────────┐
//! │ Connection │──────────▶│ Hub                             │
//! └────────────┘           │  SessionRouter ──▶ Registry     │
//!       ▲                  │  Scheduler ─────┘               │
//!       │   room state     └───────────────┬─────────────────┘
//!       └──────────────── Fanout ◀─────────┘
//! ```

pub mod fanout;
pub mod hub;
pub mod registry;
pub mod router;
pub mod scheduler;
pub mod session;

#[cfg(test)]
mod testing;

pub use fanout::{Broadcast, Fanout, Outbound};
pub use huddle_protocol::Member;
pub use hub::{Hub, HubError, HubHandle};
pub use registry::{Registry, RegistryConfig, RegistryStats, Room};
pub use router::SessionRouter;
pub use scheduler::Scheduler;
pub use session::SessionId;
