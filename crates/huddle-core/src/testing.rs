//! Test double recording every fan-out call.

use crate::fanout::Broadcast;
use crate::session::SessionId;
use huddle_protocol::Envelope;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Join(String, String),
    Emit(String, String),
}

#[derive(Debug, Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// `(room, data)` of every emit, in order.
    pub fn emits(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Emit(room, data) => Some((room, data)),
                Call::Join(..) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl Broadcast for Recorder {
    fn join(&self, session_id: &SessionId, room_id: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Join(session_id.to_string(), room_id.to_string()));
    }

    fn emit_to_room(&self, room_id: &str, envelope: Envelope) -> usize {
        assert_eq!(envelope.event, "room");
        self.calls
            .lock()
            .unwrap()
            .push(Call::Emit(room_id.to_string(), envelope.data));
        1
    }
}

pub fn emit(room: &str, data: &str) -> (String, String) {
    (room.to_string(), data.to_string())
}
