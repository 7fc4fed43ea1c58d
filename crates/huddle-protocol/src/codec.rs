//! Envelope framing.
//!
//! Every WebSocket message carries one envelope as JSON. Text messages are
//! the normal case; binary messages are accepted when they hold the same
//! UTF-8 JSON. Envelopes sent by the server are always text.

use thiserror::Error;

use crate::frames::Envelope;

/// Maximum encoded envelope size (1 MiB).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Protocol errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Envelope exceeds maximum size.
    #[error("Frame size {0} exceeds maximum {MAX_FRAME_SIZE}")]
    FrameTooLarge(usize),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Event name is not a client command.
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// Invalid data.
    #[error("Invalid frame: {0}")]
    Invalid(String),
}

/// Encode an envelope as JSON text.
///
/// # Errors
///
/// Returns an error if the envelope is too large or serialization fails.
pub fn encode_text(envelope: &Envelope) -> Result<String, ProtocolError> {
    let text = serde_json::to_string(envelope)?;
    if text.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(text.len()));
    }
    Ok(text)
}

/// Decode an envelope from JSON text.
///
/// # Errors
///
/// Returns an error if the text is too large or not a valid envelope.
pub fn decode_text(text: &str) -> Result<Envelope, ProtocolError> {
    decode_slice(text.as_bytes())
}

/// Decode an envelope from the payload of a binary message.
///
/// # Errors
///
/// Returns an error if the payload is too large or not a valid JSON
/// envelope.
pub fn decode_slice(data: &[u8]) -> Result<Envelope, ProtocolError> {
    if data.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(data.len()));
    }
    Ok(serde_json::from_slice(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_frames() {
        let envelope = decode_text(r#"{"event":"register","data":"lobby,b1,alice"}"#).unwrap();
        assert_eq!(envelope, Envelope::new("register", "lobby,b1,alice"));

        let text = encode_text(&Envelope::room("b1`alice`0|")).unwrap();
        assert_eq!(text, r#"{"event":"room","data":"b1`alice`0|"}"#);

        assert!(matches!(decode_text("not json"), Err(ProtocolError::Json(_))));
    }

    #[test]
    fn test_missing_data_defaults_to_empty() {
        let envelope = decode_text(r#"{"event":"zap"}"#).unwrap();
        assert_eq!(envelope, Envelope::new("zap", ""));
    }

    #[test]
    fn test_binary_payload_holds_json() {
        let envelope = decode_slice(br#"{"event":"unzap","data":"lobby"}"#).unwrap();
        assert_eq!(envelope, Envelope::new("unzap", "lobby"));

        assert!(matches!(
            decode_slice(&[0x92, 0xa3, 0x7a]),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn test_frame_too_large() {
        let envelope = Envelope::room("x".repeat(MAX_FRAME_SIZE + 1));

        match encode_text(&envelope) {
            Err(ProtocolError::FrameTooLarge(_)) => {}
            other => panic!("Expected FrameTooLarge error, got {:?}", other),
        }
        assert!(matches!(
            decode_slice(&vec![b' '; MAX_FRAME_SIZE + 1]),
            Err(ProtocolError::FrameTooLarge(_))
        ));
    }
}
