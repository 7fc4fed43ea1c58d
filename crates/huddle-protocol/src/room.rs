//! Room state encoding.
//!
//! A room is sent to clients as a flat string of member records:
//!
//! ```text
//! (board_id "`" name "`" flag "|")*      flag = "0" | "1"
//! ```
//!
//! Delimiters inside `board_id` or `name` are not escaped. A value containing
//! a backtick or a pipe corrupts the stream for every consumer of that room;
//! existing clients parse the format as-is, so it is kept unchanged.

use crate::codec::ProtocolError;
use serde::{Deserialize, Serialize};

/// Field separator within a record.
pub const FIELD_DELIMITER: char = '`';

/// Record terminator.
pub const RECORD_DELIMITER: char = '|';

/// A session's record within a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Board identifier supplied at registration.
    pub board_id: String,
    /// Display name supplied at registration.
    pub name: String,
    /// Whether the member is currently zapped.
    pub broadcasting: bool,
}

impl Member {
    /// Create a member that is not broadcasting.
    #[must_use]
    pub fn new(board_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            board_id: board_id.into(),
            name: name.into(),
            broadcasting: false,
        }
    }

    /// Append this member's record to `out`.
    pub fn encode_into(&self, out: &mut String) {
        out.push_str(&self.board_id);
        out.push(FIELD_DELIMITER);
        out.push_str(&self.name);
        out.push(FIELD_DELIMITER);
        out.push(if self.broadcasting { '1' } else { '0' });
        out.push(RECORD_DELIMITER);
    }
}

/// Encode members in iteration order. An empty room encodes to `""`.
#[must_use]
pub fn encode_room<'a, I>(members: I) -> String
where
    I: IntoIterator<Item = &'a Member>,
{
    let mut out = String::new();
    for member in members {
        member.encode_into(&mut out);
    }
    out
}

/// Parse an encoded room back into member records.
///
/// The board id ends at the first backtick and the flag follows the last one,
/// so a name containing backticks survives. A pipe inside any field cannot be
/// recovered.
///
/// # Errors
///
/// Returns an error if a record lacks its delimiters or carries a flag other
/// than `0` or `1`.
pub fn decode_room(encoded: &str) -> Result<Vec<Member>, ProtocolError> {
    let Some(body) = encoded.strip_suffix(RECORD_DELIMITER) else {
        if encoded.is_empty() {
            return Ok(Vec::new());
        }
        return Err(ProtocolError::Invalid("room state is not pipe-terminated".into()));
    };

    body.split(RECORD_DELIMITER).map(decode_record).collect()
}

fn decode_record(record: &str) -> Result<Member, ProtocolError> {
    let (board_id, rest) = record
        .split_once(FIELD_DELIMITER)
        .ok_or_else(|| ProtocolError::Invalid(format!("record without fields: {record:?}")))?;
    let (name, flag) = rest
        .rsplit_once(FIELD_DELIMITER)
        .ok_or_else(|| ProtocolError::Invalid(format!("record without flag: {record:?}")))?;

    let broadcasting = match flag {
        "0" => false,
        "1" => true,
        other => return Err(ProtocolError::Invalid(format!("bad flag {other:?}"))),
    };

    Ok(Member {
        board_id: board_id.to_string(),
        name: name.to_string(),
        broadcasting,
    })
}
