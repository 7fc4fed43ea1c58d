//! Session router.
//!
//! Dispatches named client events to registry mutations and pushes the
//! resulting room state through the fan-out.

use crate::fanout::Broadcast;
use crate::registry::Registry;
use crate::session::SessionId;
use huddle_protocol::{missing_fields, Command, Envelope, EventKind, ProtocolError};
use tracing::{debug, warn};

/// Routes one session's events into the registry.
pub struct SessionRouter<B> {
    registry: Registry,
    broadcaster: B,
}

impl<B: Broadcast> SessionRouter<B> {
    /// Create a router over an owned registry.
    #[must_use]
    pub fn new(registry: Registry, broadcaster: B) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn broadcaster(&self) -> &B {
        &self.broadcaster
    }

    /// Handle a named event from a session.
    ///
    /// Malformed payloads are applied with empty fields. Only an unknown event
    /// name is reported, and it leaves all state untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownEvent`] if the event is not a client
    /// command.
    pub fn dispatch(
        &mut self,
        session_id: &SessionId,
        event: &str,
        payload: &str,
    ) -> Result<EventKind, ProtocolError> {
        let command = Command::parse(event, payload)?;

        let missing = missing_fields(payload, command.arity());
        if missing > 0 {
            warn!(
                session = %session_id,
                event = %event,
                payload = %payload,
                missing,
                "Malformed payload, applying with empty fields"
            );
        }

        let kind = command.kind();
        self.apply(session_id, command);
        Ok(kind)
    }

    /// Apply a decoded command.
    pub fn apply(&mut self, session_id: &SessionId, command: Command) {
        match command {
            Command::Register(cmd) => {
                debug!(session = %session_id, room = %cmd.room_id, "Register");
                let encoded =
                    self.registry
                        .register(session_id, &cmd.room_id, &cmd.board_id, &cmd.name);
                self.broadcaster.join(session_id, &cmd.room_id);
                self.broadcaster
                    .emit_to_room(&cmd.room_id, Envelope::room(encoded));
            }
            Command::Zap(cmd) => self.set_broadcasting(session_id, &cmd.room_id, true),
            Command::Unzap(cmd) => self.set_broadcasting(session_id, &cmd.room_id, false),
        }
    }

    /// Toggle the session in every room it is in. Each of those rooms then
    /// receives the state of the room named by the payload, which need not be
    /// the room itself. A session that is in no room causes no broadcast.
    fn set_broadcasting(&mut self, session_id: &SessionId, target_room: &str, flag: bool) {
        let touched = self.registry.set_broadcasting(session_id, flag);
        if touched.is_empty() {
            debug!(session = %session_id, target = %target_room, "Session is in no room");
            return;
        }

        let encoded = self.registry.encode_room(target_room);
        for room_id in &touched {
            self.broadcaster
                .emit_to_room(room_id, Envelope::room(encoded.clone()));
        }
    }

    /// Remove a disconnected session and re-broadcast every room.
    pub fn disconnect(&mut self, session_id: &SessionId) {
        let touched = self.registry.remove_session(session_id);
        debug!(session = %session_id, rooms = touched.len(), "Disconnect");

        for room_id in self.registry.all_room_ids() {
            self.broadcast_room(&room_id);
        }
    }

    /// Encode a room and hand it to the fan-out. Returns the recipient count.
    pub fn broadcast_room(&self, room_id: &str) -> usize {
        let encoded = self.registry.encode_room(room_id);
        self.broadcaster
            .emit_to_room(room_id, Envelope::room(encoded))
    }

    /// Close the owned registry.
    pub fn close(&mut self) {
        self.registry.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{emit, Call, Recorder};

    fn router() -> (SessionRouter<Recorder>, Recorder) {
        let recorder = Recorder::default();
        (SessionRouter::new(Registry::new(), recorder.clone()), recorder)
    }

    #[test]
    fn test_register_joins_then_broadcasts() {
        let (mut router, recorder) = router();
        let s = SessionId::new("S");

        let kind = router.dispatch(&s, "register", "R1,b1,n1").unwrap();
        assert_eq!(kind, EventKind::Register);
        assert_eq!(
            recorder.calls(),
            vec![
                Call::Join("S".into(), "R1".into()),
                Call::Emit("R1".into(), "b1`n1`0|".into()),
            ]
        );
    }

    #[test]
    fn test_register_order_is_wire_order() {
        let (mut router, recorder) = router();
        router
            .dispatch(&SessionId::new("S1"), "register", "R1,b1,first")
            .unwrap();
        router
            .dispatch(&SessionId::new("S2"), "register", "R1,b2,second")
            .unwrap();

        assert_eq!(
            recorder.emits().last().unwrap(),
            &emit("R1", "b1`first`0|b2`second`0|")
        );
    }

    #[test]
    fn test_zap_unzap_round_trip() {
        let (mut router, recorder) = router();
        let s = SessionId::new("S");
        router.dispatch(&s, "register", "R1,b1,n1").unwrap();

        router.dispatch(&s, "zap", "R1").unwrap();
        router.dispatch(&s, "unzap", "R1").unwrap();

        let emits = recorder.emits();
        assert_eq!(emits[1], emit("R1", "b1`n1`1|"));
        assert_eq!(emits[2], emit("R1", "b1`n1`0|"));
        assert_eq!(emits[2].1, emits[0].1);
    }

    #[test]
    fn test_zap_sends_named_room_to_every_toggled_room() {
        let (mut router, recorder) = router();
        let s = SessionId::new("S");
        let t = SessionId::new("T");
        router.dispatch(&s, "register", "R1,b1,n1").unwrap();
        router.dispatch(&s, "register", "R2,b1,n1").unwrap();
        router.dispatch(&t, "register", "R2,b2,n2").unwrap();
        recorder.clear();

        router.dispatch(&s, "zap", "R1,extra").unwrap();

        assert_eq!(
            recorder.emits(),
            vec![emit("R1", "b1`n1`1|"), emit("R2", "b1`n1`1|")]
        );
        assert_eq!(router.registry().encode_room("R2"), "b1`n1`1|b2`n2`0|");
    }

    #[test]
    fn test_zap_from_roomless_session_broadcasts_nothing() {
        let (mut router, recorder) = router();
        router
            .dispatch(&SessionId::new("T"), "register", "R2,b2,n2")
            .unwrap();
        recorder.clear();

        router
            .dispatch(&SessionId::new("L"), "zap", "R2")
            .unwrap();
        router
            .dispatch(&SessionId::new("L"), "unzap", "nowhere")
            .unwrap();

        assert!(recorder.emits().is_empty());
    }

    #[test]
    fn test_zap_for_unknown_room_sends_empty_state() {
        let (mut router, recorder) = router();
        let s = SessionId::new("S");
        router.dispatch(&s, "register", "R1,b1,n1").unwrap();
        recorder.clear();

        router.dispatch(&s, "zap", "nowhere").unwrap();

        assert_eq!(recorder.emits(), vec![emit("R1", "")]);
        assert_eq!(router.registry().encode_room("R1"), "b1`n1`1|");
    }

    #[test]
    fn test_disconnect_rebroadcasts_every_room() {
        let (mut router, recorder) = router();
        let s1 = SessionId::new("S1");
        let s2 = SessionId::new("S2");
        router.dispatch(&s1, "register", "R1,b1,n1").unwrap();
        router.dispatch(&s2, "register", "R2,b2,n2").unwrap();
        recorder.clear();

        router.disconnect(&s1);

        assert_eq!(
            recorder.emits(),
            vec![emit("R1", ""), emit("R2", "b2`n2`0|")]
        );
    }

    #[test]
    fn test_malformed_payload_is_applied() {
        let (mut router, recorder) = router();
        router
            .dispatch(&SessionId::new("S"), "register", "R1")
            .unwrap();
        assert_eq!(recorder.emits(), vec![emit("R1", "``0|")]);
    }

    #[test]
    fn test_unknown_event_leaves_state_untouched() {
        let (mut router, recorder) = router();
        let result = router.dispatch(&SessionId::new("S"), "room", "R1,b1,n1");

        assert!(matches!(result, Err(ProtocolError::UnknownEvent(_))));
        assert!(recorder.calls().is_empty());
        assert!(router.registry().all_room_ids().is_empty());
    }
}
