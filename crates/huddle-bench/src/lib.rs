//! Fixtures shared by the Huddle benchmarks.

use huddle_core::{Fanout, Outbound, Registry, SessionId};
use huddle_protocol::Envelope;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Session id for member `member` of room `room`.
#[must_use]
pub fn session(room: usize, member: usize) -> SessionId {
    SessionId::new(format!("sess-{room}-{member}"))
}

/// Room id for index `room`.
#[must_use]
pub fn room_id(room: usize) -> String {
    format!("room-{room}")
}

/// A registry with `rooms` rooms of `members` members each.
#[must_use]
pub fn populated_registry(rooms: usize, members: usize) -> Registry {
    let mut registry = Registry::new();
    for r in 0..rooms {
        let room = room_id(r);
        for m in 0..members {
            registry.register(&session(r, m), &room, &format!("board-{m}"), &format!("player {m}"));
        }
    }
    registry
}

/// A fan-out with `members` sessions joined to one room.
///
/// The receivers are returned so the queues stay open.
#[must_use]
pub fn joined_fanout(
    room: &str,
    members: usize,
) -> (Arc<Fanout>, Vec<mpsc::UnboundedReceiver<Arc<Envelope>>>) {
    use huddle_core::Broadcast;

    let fanout = Arc::new(Fanout::new());
    let mut receivers = Vec::with_capacity(members);
    for m in 0..members {
        let (tx, rx): (Outbound, _) = mpsc::unbounded_channel();
        let id = session(0, m);
        fanout.attach(id.clone(), tx);
        fanout.join(&id, room);
        receivers.push(rx);
    }
    (fanout, receivers)
}

/// Discard everything queued on the receivers.
pub fn drain(receivers: &mut [mpsc::UnboundedReceiver<Arc<Envelope>>]) {
    for rx in receivers {
        while rx.try_recv().is_ok() {}
    }
}
