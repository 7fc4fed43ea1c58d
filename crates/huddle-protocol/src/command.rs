//! Client command payloads.
//!
//! Commands arrive as comma-delimited strings. Fields are positional: the
//! payload is split on every comma and only the leading fields a command needs
//! are read. A comma inside a field therefore truncates it, and anything past
//! the expected arity is dropped.
//!
//! Short payloads are tolerated. Missing fields decode as empty strings so the
//! command still applies; callers can use [`missing_fields`] to log them.

use crate::codec::ProtocolError;
use crate::frames::EventKind;

/// Field separator for command payloads.
pub const COMMAND_DELIMITER: char = ',';

/// Split `payload` into exactly `arity` fields.
///
/// Surplus fields are ignored and missing ones are padded with `""`.
#[must_use]
pub fn decode_fields(payload: &str, arity: usize) -> Vec<&str> {
    let mut fields: Vec<&str> = payload.split(COMMAND_DELIMITER).take(arity).collect();
    fields.resize(arity, "");
    fields
}

/// Number of fields a payload is short of `arity`.
#[must_use]
pub fn missing_fields(payload: &str, arity: usize) -> usize {
    arity.saturating_sub(payload.split(COMMAND_DELIMITER).count())
}

/// `register` payload: `room_id,board_id,name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterCommand {
    pub room_id: String,
    pub board_id: String,
    pub name: String,
}

impl RegisterCommand {
    pub const ARITY: usize = 3;

    #[must_use]
    pub fn decode(payload: &str) -> Self {
        let fields = decode_fields(payload, Self::ARITY);
        Self {
            room_id: fields[0].to_string(),
            board_id: fields[1].to_string(),
            name: fields[2].to_string(),
        }
    }
}

/// `zap` / `unzap` payload: `room_id,...`.
///
/// Only the first field is read. It names the room whose state is broadcast
/// afterwards, not the rooms whose flag is toggled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZapCommand {
    pub room_id: String,
}

impl ZapCommand {
    pub const ARITY: usize = 1;

    #[must_use]
    pub fn decode(payload: &str) -> Self {
        let fields = decode_fields(payload, Self::ARITY);
        Self {
            room_id: fields[0].to_string(),
        }
    }
}

/// A decoded client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Join a room and create or overwrite the session's member record.
    Register(RegisterCommand),
    /// Set the broadcasting flag.
    Zap(ZapCommand),
    /// Clear the broadcasting flag.
    Unzap(ZapCommand),
}

impl Command {
    /// Decode a command from its event name and payload.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownEvent`] if the event is not a client
    /// command. Malformed payloads never fail.
    pub fn parse(event: &str, payload: &str) -> Result<Self, ProtocolError> {
        match EventKind::from_name(event) {
            Some(EventKind::Register) => Ok(Command::Register(RegisterCommand::decode(payload))),
            Some(EventKind::Zap) => Ok(Command::Zap(ZapCommand::decode(payload))),
            Some(EventKind::Unzap) => Ok(Command::Unzap(ZapCommand::decode(payload))),
            _ => Err(ProtocolError::UnknownEvent(event.to_string())),
        }
    }

    /// The event this command was decoded from.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Command::Register(_) => EventKind::Register,
            Command::Zap(_) => EventKind::Zap,
            Command::Unzap(_) => EventKind::Unzap,
        }
    }

    /// Number of payload fields the command reads.
    #[must_use]
    pub fn arity(&self) -> usize {
        match self {
            Command::Register(_) => RegisterCommand::ARITY,
            Command::Zap(_) | Command::Unzap(_) => ZapCommand::ARITY,
        }
    }

    /// The room named by the payload.
    #[must_use]
    pub fn room_id(&self) -> &str {
        match self {
            Command::Register(cmd) => &cmd.room_id,
            Command::Zap(cmd) | Command::Unzap(cmd) => &cmd.room_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_fields_pads_and_truncates() {
        assert_eq!(decode_fields("a,b,c,d", 3), vec!["a", "b", "c"]);
        assert_eq!(decode_fields("a", 3), vec!["a", "", ""]);
        assert_eq!(decode_fields("", 1), vec![""]);
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(missing_fields("r,b,n", 3), 0);
        assert_eq!(missing_fields("r,b,n,extra", 3), 0);
        assert_eq!(missing_fields("r", 3), 2);
        assert_eq!(missing_fields("", 1), 0);
    }

    #[test]
    fn test_register_name_truncated_at_comma() {
        let cmd = RegisterCommand::decode("lobby,b1,Smith, John");
        assert_eq!(cmd.room_id, "lobby");
        assert_eq!(cmd.board_id, "b1");
        assert_eq!(cmd.name, "Smith");
    }

    #[test]
    fn test_parse_commands() {
        let cmd = Command::parse("register", "lobby,b1,alice").unwrap();
        assert_eq!(cmd.kind(), EventKind::Register);
        assert_eq!(cmd.room_id(), "lobby");

        let cmd = Command::parse("zap", "lobby,ignored,fields").unwrap();
        assert_eq!(
            cmd,
            Command::Zap(ZapCommand {
                room_id: "lobby".into()
            })
        );

        let cmd = Command::parse("unzap", "lobby").unwrap();
        assert_eq!(cmd.kind(), EventKind::Unzap);
        assert_eq!(cmd.arity(), 1);
    }

    #[test]
    fn test_parse_unknown_event() {
        assert!(matches!(
            Command::parse("teleport", "x"),
            Err(ProtocolError::UnknownEvent(_))
        ));
        // `room` is server-to-client only
        assert!(Command::parse("room", "").is_err());
    }
}
