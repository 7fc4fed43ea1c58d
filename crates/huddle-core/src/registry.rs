//! Room registry.
//!
//! The registry maps room ids to rooms, and each room maps session ids to
//! member records. Both maps keep insertion order: member order is the order
//! records appear on the wire, and room order is the order the periodic
//! refresh walks them.
//!
//! Every lookup tolerates missing keys. Operating on an unknown room or
//! session is a no-op.

use crate::session::SessionId;
use huddle_protocol::{encode_room, Member};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, trace};

/// Registry configuration.
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Drop a room once its last member leaves.
    ///
    /// Off by default: empty rooms are kept and keep receiving `""` on every
    /// refresh.
    pub evict_empty_rooms: bool,
}

/// A room's ordered member records.
#[derive(Debug, Default)]
pub struct Room {
    members: IndexMap<SessionId, Member>,
}

impl Room {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.members.contains_key(session_id)
    }

    /// Get a session's member record.
    #[must_use]
    pub fn member(&self, session_id: &SessionId) -> Option<&Member> {
        self.members.get(session_id)
    }

    /// Members in wire order.
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    /// Encode the room for the wire.
    #[must_use]
    pub fn encode(&self) -> String {
        encode_room(self.members.values())
    }

    /// Insert or overwrite a member. An overwritten member keeps its position.
    fn upsert(&mut self, session_id: SessionId, member: Member) -> bool {
        self.members.insert(session_id, member).is_none()
    }

    fn set_broadcasting(&mut self, session_id: &SessionId, flag: bool) -> bool {
        match self.members.get_mut(session_id) {
            Some(member) => {
                member.broadcasting = flag;
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, session_id: &SessionId) -> Option<Member> {
        // shift_remove keeps the remaining members in order
        self.members.shift_remove(session_id)
    }
}

/// Registry statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RegistryStats {
    /// Number of rooms, empty ones included.
    #[serde(rename = "rooms")]
    pub room_count: usize,
    /// Number of member records across all rooms.
    #[serde(rename = "members")]
    pub member_count: usize,
}

/// In-memory store of every room.
#[derive(Debug, Default)]
pub struct Registry {
    rooms: IndexMap<String, Room>,
    config: RegistryConfig,
    closed: bool,
}

impl Registry {
    /// Create an empty registry with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with custom configuration.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        info!("Creating registry with config: {:?}", config);
        Self {
            rooms: IndexMap::new(),
            config,
            closed: false,
        }
    }

    /// Drop every room. A closed registry ignores further mutations.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        let stats = self.stats();
        self.rooms.clear();
        self.closed = true;
        info!(
            rooms = stats.room_count,
            members = stats.member_count,
            "Registry closed"
        );
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Register a session into a room.
    ///
    /// Creates the room if needed and inserts or overwrites the session's
    /// member record with `broadcasting = false`. Returns the room's encoded
    /// state afterwards.
    pub fn register(
        &mut self,
        session_id: &SessionId,
        room_id: &str,
        board_id: &str,
        name: &str,
    ) -> String {
        if self.closed {
            debug!(session = %session_id, room = %room_id, "Register on closed registry ignored");
            return String::new();
        }

        let room = self.rooms.entry(room_id.to_string()).or_insert_with(|| {
            debug!(room = %room_id, "Creating new room");
            Room::new()
        });

        let is_new = room.upsert(session_id.clone(), Member::new(board_id, name));

        debug!(
            session = %session_id,
            room = %room_id,
            board = %board_id,
            members = room.len(),
            new_member = is_new,
            "Registered"
        );

        room.encode()
    }

    /// Set the broadcasting flag on every member record the session owns.
    ///
    /// Returns the ids of the rooms that were changed.
    pub fn set_broadcasting(&mut self, session_id: &SessionId, flag: bool) -> Vec<String> {
        if self.closed {
            return Vec::new();
        }

        let touched: Vec<String> = self
            .rooms
            .iter_mut()
            .filter_map(|(room_id, room)| {
                room.set_broadcasting(session_id, flag)
                    .then(|| room_id.clone())
            })
            .collect();

        debug!(session = %session_id, broadcasting = flag, rooms = touched.len(), "Broadcasting flag set");
        touched
    }

    /// Remove the session's member record from every room.
    ///
    /// Returns the ids of the rooms it was removed from.
    pub fn remove_session(&mut self, session_id: &SessionId) -> Vec<String> {
        if self.closed {
            return Vec::new();
        }

        let touched: Vec<String> = self
            .rooms
            .iter_mut()
            .filter_map(|(room_id, room)| room.remove(session_id).map(|_| room_id.clone()))
            .collect();

        if self.config.evict_empty_rooms {
            for room_id in &touched {
                if self.rooms.get(room_id).is_some_and(Room::is_empty) {
                    self.rooms.shift_remove(room_id);
                    debug!(room = %room_id, "Evicted empty room");
                }
            }
        }

        debug!(session = %session_id, rooms = touched.len(), "Session removed");
        touched
    }

    /// Encode a room's current members. Unknown rooms encode to `""`.
    #[must_use]
    pub fn encode_room(&self, room_id: &str) -> String {
        let encoded = self.rooms.get(room_id).map(Room::encode).unwrap_or_default();
        trace!(room = %room_id, encoded = %encoded, "Encoded room");
        encoded
    }

    /// Every room id, in creation order.
    #[must_use]
    pub fn all_room_ids(&self) -> Vec<String> {
        self.rooms.keys().cloned().collect()
    }

    /// Rooms in which the session currently has a member record.
    #[must_use]
    pub fn rooms_of(&self, session_id: &SessionId) -> Vec<String> {
        self.rooms
            .iter()
            .filter(|(_, room)| room.contains(session_id))
            .map(|(room_id, _)| room_id.clone())
            .collect()
    }

    /// Look up a room.
    #[must_use]
    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            room_count: self.rooms.len(),
            member_count: self.rooms.values().map(Room::len).sum(),
        }
    }
}
