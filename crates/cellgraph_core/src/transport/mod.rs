//! Transport adapter owning the single logical server connection.
//!
//! # Responsibility
//! - Open/close the connection behind an explicit state machine.
//! - Encode outbound messages and hand them to the connection, best effort.
//! - Drain and decode inbound frames in arrival order.
//!
//! # Invariants
//! - `connect()` while `Connecting`/`Connected` is a no-op; at most one
//!   connection is open per adapter.
//! - `send()` before the connection is established drops the message; there
//!   is no queue and no retry.
//! - Inbound order equals arrival order; nothing is reordered or de-duplicated.
//! - Undecodable frames are skipped with a log event, never surfaced.
//! - A connection lost while sending is reported by the next `poll()`.

use crate::dispatch::MessageSink;
use crate::protocol::{
    decode_server_message, encode_client_message, message_type_of, ClientMessage, ServerMessage,
};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod ws;

pub use memory::{loopback, MemoryConnection, MemoryConnector, MemoryServer};
pub use ws::{WsConnection, WsConnector};

/// Upper bound on frames drained by one `poll()` call.
pub const MAX_FRAMES_PER_POLL: usize = 256;

pub type TransportResult<T> = Result<T, TransportError>;

/// Connection-level failures.
#[derive(Debug)]
pub enum TransportError {
    /// WebSocket handshake or framing failure.
    WebSocket(tungstenite::Error),
    /// Socket configuration failure.
    Io(std::io::Error),
    /// Peer refused the connection attempt.
    Refused(String),
    /// Connection was closed by the peer.
    Closed,
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WebSocket(err) => write!(f, "websocket error: {err}"),
            Self::Io(err) => write!(f, "socket error: {err}"),
            Self::Refused(endpoint) => write!(f, "connection refused: {endpoint}"),
            Self::Closed => write!(f, "connection closed by peer"),
        }
    }
}

impl Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::WebSocket(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Refused(_) => None,
            Self::Closed => None,
        }
    }
}

impl From<tungstenite::Error> for TransportError {
    fn from(value: tungstenite::Error) -> Self {
        match value {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                Self::Closed
            }
            other => Self::WebSocket(other),
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// One open text-frame channel.
pub trait Connection: Send {
    /// Transmits one text frame.
    fn send_text(&mut self, text: &str) -> TransportResult<()>;

    /// Returns the next pending frame, or `Ok(None)` when nothing is pending.
    ///
    /// Must not block.
    fn try_recv_text(&mut self) -> TransportResult<Option<String>>;

    /// Closes the channel. Errors are ignored.
    fn close(&mut self);
}

/// Factory for connections to one endpoint.
pub trait Connector: Send {
    type Conn: Connection;

    fn open(&mut self) -> TransportResult<Self::Conn>;

    /// Endpoint description for log events.
    fn endpoint(&self) -> String;
}

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

/// Result of draining the connection once.
#[derive(Debug, Default)]
pub struct PollOutcome {
    /// Decoded messages in arrival order.
    pub messages: Vec<ServerMessage>,
    /// Frames that failed to decode and were skipped.
    pub skipped: usize,
    /// Whether the connection dropped during this poll.
    pub disconnected: bool,
}

/// Owns the connector and at most one live connection.
pub struct TransportAdapter<C: Connector> {
    connector: C,
    state: ConnectionState,
    connection: Option<C::Conn>,
    /// Set when `send` lost the connection; drained by `poll`.
    lost: bool,
}

impl<C: Connector> TransportAdapter<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            state: ConnectionState::Disconnected,
            connection: None,
            lost: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Opens the connection.
    ///
    /// Returns `Ok(true)` when a new connection was established and
    /// `Ok(false)` when one was already open or opening.
    ///
    /// # Errors
    /// - Returns the connector's error when the connection cannot be opened;
    ///   the adapter is back in `Disconnected` afterwards.
    pub fn connect(&mut self) -> TransportResult<bool> {
        if self.state != ConnectionState::Disconnected {
            debug!(
                "event=transport_connect module=transport status=skip state={}",
                self.state.as_str()
            );
            return Ok(false);
        }

        self.state = ConnectionState::Connecting;
        let endpoint = self.connector.endpoint();
        info!("event=transport_connect module=transport status=start endpoint={endpoint}");

        match self.connector.open() {
            Ok(connection) => {
                self.connection = Some(connection);
                self.lost = false;
                self.state = ConnectionState::Connected;
                info!("event=transport_connect module=transport status=ok endpoint={endpoint}");
                Ok(true)
            }
            Err(err) => {
                self.state = ConnectionState::Disconnected;
                warn!(
                    "event=transport_connect module=transport status=error endpoint={endpoint} error={err}"
                );
                Err(err)
            }
        }
    }

    /// Closes the connection, if any.
    pub fn disconnect(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close();
            info!("event=transport_disconnect module=transport status=ok reason=local");
        }
        self.state = ConnectionState::Disconnected;
        self.lost = false;
    }

    /// Encodes and transmits one message, best effort.
    ///
    /// Returns whether the message was handed to an open connection.
    pub fn send(&mut self, message: &ClientMessage) -> bool {
        let Some(connection) = self.connection.as_mut() else {
            debug!(
                "event=transport_send module=transport status=skip reason=not_connected type={}",
                message.type_name()
            );
            return false;
        };

        let text = match encode_client_message(message) {
            Ok(text) => text,
            Err(err) => {
                warn!(
                    "event=transport_send module=transport status=error type={} error={err}",
                    message.type_name()
                );
                return false;
            }
        };

        match connection.send_text(&text) {
            Ok(()) => {
                debug!(
                    "event=transport_send module=transport status=ok type={} bytes={}",
                    message.type_name(),
                    text.len()
                );
                true
            }
            Err(err) => {
                warn!(
                    "event=transport_send module=transport status=error type={} error={err}",
                    message.type_name()
                );
                // Why: callers only learn about drops through `poll`, and a
                // send failure leaves no connection for `poll` to read from.
                self.drop_connection();
                self.lost = true;
                false
            }
        }
    }

    /// Drains pending inbound frames, decoding them in arrival order.
    pub fn poll(&mut self) -> PollOutcome {
        let mut outcome = PollOutcome::default();
        let Some(connection) = self.connection.as_mut() else {
            outcome.disconnected = std::mem::take(&mut self.lost);
            return outcome;
        };

        let mut lost = false;
        for _ in 0..MAX_FRAMES_PER_POLL {
            match connection.try_recv_text() {
                Ok(Some(text)) => match decode_server_message(&text) {
                    Ok(message) => outcome.messages.push(message),
                    Err(err) => {
                        outcome.skipped += 1;
                        warn!(
                            "event=transport_recv module=transport status=skip type={} bytes={} error={err}",
                            message_type_of(&text).unwrap_or_else(|| "none".to_string()),
                            text.len()
                        );
                    }
                },
                Ok(None) => break,
                Err(err) => {
                    info!("event=transport_recv module=transport status=error error={err}");
                    lost = true;
                    break;
                }
            }
        }

        if lost {
            self.drop_connection();
            outcome.disconnected = true;
        }
        outcome
    }

    fn drop_connection(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close();
        }
        self.state = ConnectionState::Disconnected;
        info!("event=transport_disconnect module=transport status=ok reason=remote");
    }
}

impl<C: Connector> MessageSink for TransportAdapter<C> {
    fn send(&mut self, message: &ClientMessage) -> bool {
        TransportAdapter::send(self, message)
    }
}

impl<C: Connector> Drop for TransportAdapter<C> {
    fn drop(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close();
        }
    }
}
