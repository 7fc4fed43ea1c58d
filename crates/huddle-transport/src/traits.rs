//! Transport abstraction traits.

use async_trait::async_trait;
use huddle_core::SessionId;
use huddle_protocol::Envelope;
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection was closed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Message exceeds the configured size limit.
    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// Failed to send data.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Failed to receive data.
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    /// A frame could not be decoded.
    #[error("Protocol error: {0}")]
    Protocol(#[from] huddle_protocol::ProtocolError),
}

impl TransportError {
    /// Whether the connection is unusable after this error.
    ///
    /// Undecodable or oversized frames are dropped and the connection stays
    /// open.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            TransportError::Protocol(_) | TransportError::MessageTooLarge { .. }
        )
    }
}

/// An active client connection.
#[async_trait]
pub trait Connection: Send {
    /// The session identifier assigned to this connection.
    fn id(&self) -> &SessionId;

    /// Receive the next envelope.
    ///
    /// Returns `None` once the peer has closed the connection.
    async fn recv(&mut self) -> Result<Option<Envelope>, TransportError>;

    /// Send an envelope.
    async fn send(&mut self, envelope: &Envelope) -> Result<(), TransportError>;

    /// Close the connection gracefully.
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Remote address, if known.
    fn remote_addr(&self) -> Option<String> {
        None
    }

    fn is_open(&self) -> bool;
}
