//! WebSocket transport over a non-blocking TCP socket.
//!
//! The handshake is performed blocking inside `open()`; afterwards the socket
//! is switched to non-blocking so `try_recv_text()` can be pumped from the
//! caller's event loop without stalling it.

use crate::transport::{Connection, Connector, TransportError, TransportResult};
use log::debug;
use std::io::ErrorKind;
use std::net::TcpStream;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

/// Connector for one `ws://` endpoint.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Connector for WsConnector {
    type Conn = WsConnection;

    fn open(&mut self) -> TransportResult<WsConnection> {
        let (mut socket, response) = tungstenite::connect(self.url.as_str())?;
        debug!(
            "event=ws_handshake module=transport status=ok http_status={}",
            response.status().as_u16()
        );
        // Why: the handshake needs a blocking socket, but `poll` must return
        // as soon as no frame is ready, so the switch happens after it.
        match socket.get_mut() {
            MaybeTlsStream::Plain(stream) => stream.set_nonblocking(true)?,
            _ => return Err(TransportError::Refused(self.url.clone())),
        }
        Ok(WsConnection { socket })
    }

    fn endpoint(&self) -> String {
        self.url.clone()
    }
}

/// Live WebSocket connection.
pub struct WsConnection {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
}

impl Connection for WsConnection {
    fn send_text(&mut self, text: &str) -> TransportResult<()> {
        match self.socket.send(Message::text(text.to_owned())) {
            Ok(()) => Ok(()),
            // Frame is buffered; the next read/flush completes the write.
            Err(tungstenite::Error::Io(err)) if err.kind() == ErrorKind::WouldBlock => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn try_recv_text(&mut self) -> TransportResult<Option<String>> {
        loop {
            match self.socket.read() {
                Ok(Message::Text(text)) => return Ok(Some(text.as_str().to_owned())),
                Ok(Message::Close(_)) => return Err(TransportError::Closed),
                Ok(Message::Binary(_) | Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {
                    continue
                }
                Err(tungstenite::Error::Io(err)) if err.kind() == ErrorKind::WouldBlock => {
                    return Ok(None)
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn close(&mut self) {
        let _ = self.socket.close(None);
        let _ = self.socket.flush();
    }
}
