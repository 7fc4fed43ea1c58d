//! WebSocket connections.
//!
//! Wraps an upgraded axum WebSocket. Inbound text and binary messages both
//! carry a JSON envelope; outbound envelopes are sent as text.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use huddle_core::SessionId;
use huddle_protocol::{codec, Envelope, ProtocolError};
use std::net::SocketAddr;
use tracing::{debug, trace, warn};

use crate::traits::{Connection, TransportError};

/// Default maximum inbound message size (64 KiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// A client connected over WebSocket.
pub struct WebSocketConnection {
    id: SessionId,
    socket: WebSocket,
    remote_addr: Option<SocketAddr>,
    is_open: bool,
    max_message_size: usize,
}

impl WebSocketConnection {
    /// Wrap an upgraded socket, assigning it a fresh session id.
    #[must_use]
    pub fn new(socket: WebSocket, max_message_size: usize) -> Self {
        Self {
            id: SessionId::generate(),
            socket,
            remote_addr: None,
            is_open: true,
            max_message_size,
        }
    }

    #[must_use]
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    fn check_size(&self, size: usize) -> Result<(), TransportError> {
        if size > self.max_message_size {
            warn!(
                session = %self.id,
                size,
                max = self.max_message_size,
                "Message too large"
            );
            return Err(TransportError::MessageTooLarge {
                size,
                max: self.max_message_size,
            });
        }
        Ok(())
    }
}

/// Frame an envelope as a WebSocket text message.
///
/// # Errors
///
/// Returns an error if the envelope cannot be encoded.
pub fn encode_message(envelope: &Envelope) -> Result<Message, ProtocolError> {
    Ok(Message::Text(codec::encode_text(envelope)?))
}

#[async_trait]
impl Connection for WebSocketConnection {
    fn id(&self) -> &SessionId {
        &self.id
    }

    async fn recv(&mut self) -> Result<Option<Envelope>, TransportError> {
        loop {
            match self.socket.recv().await {
                Some(Ok(Message::Text(text))) => {
                    self.check_size(text.len())?;
                    return Ok(Some(codec::decode_text(&text)?));
                }
                Some(Ok(Message::Binary(data))) => {
                    self.check_size(data.len())?;
                    return Ok(Some(codec::decode_slice(&data)?));
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                    // Pongs are queued by the socket itself
                    trace!(session = %self.id, "Control frame");
                }
                Some(Ok(Message::Close(_))) => {
                    debug!(session = %self.id, "Received close frame");
                    self.is_open = false;
                    return Ok(None);
                }
                Some(Err(e)) => {
                    self.is_open = false;
                    return Err(TransportError::ReceiveFailed(e.to_string()));
                }
                None => {
                    debug!(session = %self.id, "WebSocket stream ended");
                    self.is_open = false;
                    return Ok(None);
                }
            }
        }
    }

    async fn send(&mut self, envelope: &Envelope) -> Result<(), TransportError> {
        if !self.is_open {
            return Err(TransportError::ConnectionClosed);
        }

        let message = encode_message(envelope)?;
        self.socket
            .send(message)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if !self.is_open {
            return Ok(());
        }
        self.is_open = false;

        self.socket
            .send(Message::Close(None))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    fn remote_addr(&self) -> Option<String> {
        self.remote_addr.map(|addr| addr.to_string())
    }

    fn is_open(&self) -> bool {
        self.is_open
    }
}
