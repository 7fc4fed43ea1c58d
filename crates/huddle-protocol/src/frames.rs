//! Event envelopes.
//!
//! Every message exchanged over the socket is a named event with a flat
//! string payload.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Known event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Client joins a room.
    Register,
    /// Client sets its broadcasting flag.
    Zap,
    /// Client clears its broadcasting flag.
    Unzap,
    /// Server pushes a room's encoded state.
    Room,
}

impl EventKind {
    /// Wire name of the event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EventKind::Register => "register",
            EventKind::Zap => "zap",
            EventKind::Unzap => "unzap",
            EventKind::Room => "room",
        }
    }

    /// Look up an event by its wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "register" => Some(EventKind::Register),
            "zap" => Some(EventKind::Zap),
            "unzap" => Some(EventKind::Unzap),
            "room" => Some(EventKind::Room),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named event and its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Event name.
    pub event: String,
    /// Flat string payload.
    #[serde(default)]
    pub data: String,
}

impl Envelope {
    /// Create a new envelope.
    #[must_use]
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }

    /// Create a `room` event carrying encoded room state.
    #[must_use]
    pub fn room(encoded: impl Into<String>) -> Self {
        Self::new(EventKind::Room.as_str(), encoded)
    }

    /// The event kind, if the name is known.
    #[must_use]
    pub fn kind(&self) -> Option<EventKind> {
        EventKind::from_name(&self.event)
    }
}
