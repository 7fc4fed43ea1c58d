//! Room-scoped fan-out.
//!
//! Sessions attach an outbound queue when they connect and are joined to
//! rooms as they register. Emitting to a room pushes the envelope onto the
//! queue of every joined session without waiting for delivery.

use crate::session::SessionId;
use dashmap::{DashMap, DashSet};
use huddle_protocol::Envelope;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Per-session outbound queue.
pub type Outbound = mpsc::UnboundedSender<Arc<Envelope>>;

/// Room-scoped delivery used by the session router.
pub trait Broadcast: Send + Sync {
    /// Add a session to a room's delivery group.
    fn join(&self, session_id: &SessionId, room_id: &str);

    /// Deliver an envelope to every session joined to a room.
    ///
    /// Returns the number of sessions it was queued for.
    fn emit_to_room(&self, room_id: &str, envelope: Envelope) -> usize;
}

impl<B: Broadcast + ?Sized> Broadcast for Arc<B> {
    fn join(&self, session_id: &SessionId, room_id: &str) {
        (**self).join(session_id, room_id);
    }

    fn emit_to_room(&self, room_id: &str, envelope: Envelope) -> usize {
        (**self).emit_to_room(room_id, envelope)
    }
}

/// Connected sessions and their room delivery groups.
#[derive(Debug, Default)]
pub struct Fanout {
    /// Outbound queue per connected session.
    sessions: DashMap<SessionId, Outbound>,
    /// Room id -> joined sessions.
    rooms: DashMap<String, DashSet<SessionId>>,
    /// Session id -> rooms it was joined to.
    joined: DashMap<SessionId, DashSet<String>>,
}

impl Fanout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a connected session's outbound queue.
    pub fn attach(&self, session_id: SessionId, outbound: Outbound) {
        debug!(session = %session_id, "Session attached");
        self.sessions.insert(session_id, outbound);
    }

    /// Detach a session and leave every room it joined.
    pub fn detach(&self, session_id: &SessionId) {
        self.sessions.remove(session_id);
        self.leave_all(session_id);
        debug!(session = %session_id, "Session detached");
    }

    fn leave_all(&self, session_id: &SessionId) {
        if let Some((_, rooms)) = self.joined.remove(session_id) {
            for room_id in rooms.iter() {
                if let Some(members) = self.rooms.get(room_id.as_str()) {
                    members.remove(session_id);
                }
                self.rooms
                    .remove_if(room_id.as_str(), |_, members| members.is_empty());
            }
        }
    }

    /// Number of attached sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Number of rooms with at least one joined session.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Number of sessions joined to a room.
    #[must_use]
    pub fn joined_count(&self, room_id: &str) -> usize {
        self.rooms.get(room_id).map(|m| m.len()).unwrap_or(0)
    }

    /// Rooms a session has been joined to.
    #[must_use]
    pub fn rooms_joined(&self, session_id: &SessionId) -> Vec<String> {
        self.joined
            .get(session_id)
            .map(|rooms| rooms.iter().map(|r| r.clone()).collect())
            .unwrap_or_default()
    }
}

impl Broadcast for Fanout {
    fn join(&self, session_id: &SessionId, room_id: &str) {
        if !self.sessions.contains_key(session_id) {
            trace!(session = %session_id, room = %room_id, "Join for detached session ignored");
            return;
        }

        self.rooms
            .entry(room_id.to_string())
            .or_default()
            .insert(session_id.clone());
        self.joined
            .entry(session_id.clone())
            .or_default()
            .insert(room_id.to_string());

        // A detach that ran after the check above may have missed these entries
        if !self.sessions.contains_key(session_id) {
            self.leave_all(session_id);
            trace!(session = %session_id, room = %room_id, "Session detached while joining");
            return;
        }

        debug!(session = %session_id, room = %room_id, "Joined room");
    }

    fn emit_to_room(&self, room_id: &str, envelope: Envelope) -> usize {
        let Some(members) = self.rooms.get(room_id) else {
            trace!(room = %room_id, "Emit to room without listeners");
            return 0;
        };

        let envelope = Arc::new(envelope);
        let mut delivered = 0;
        for session_id in members.iter() {
            if let Some(outbound) = self.sessions.get(session_id.key()) {
                if outbound.send(Arc::clone(&envelope)).is_ok() {
                    delivered += 1;
                }
            }
        }

        trace!(room = %room_id, recipients = delivered, "Emitted to room");
        delivered
    }
}
