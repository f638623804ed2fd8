//! In-process loopback transport.
//!
//! `MemoryConnector` plays the client side; `MemoryServer` plays the server
//! side and sees every connection the connector opened. Used by tests and by
//! embedders that host the notebook engine in the same process.

use crate::protocol::{decode_client_message, encode_server_message, ClientMessage, ServerMessage};
use crate::transport::{Connection, Connector, TransportError, TransportResult};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use log::warn;

/// Creates a connected connector/server pair.
pub fn loopback() -> (MemoryConnector, MemoryServer) {
    let (link_tx, link_rx) = unbounded();
    (
        MemoryConnector { link_tx },
        MemoryServer {
            link_rx,
            peers: Vec::new(),
        },
    )
}

struct MemoryPeer {
    inbound: Receiver<String>,
    outbound: Sender<String>,
}

/// Client side of the loopback.
pub struct MemoryConnector {
    link_tx: Sender<MemoryPeer>,
}

impl Connector for MemoryConnector {
    type Conn = MemoryConnection;

    fn open(&mut self) -> TransportResult<MemoryConnection> {
        let (to_server_tx, to_server_rx) = unbounded();
        let (to_client_tx, to_client_rx) = unbounded();
        self.link_tx
            .send(MemoryPeer {
                inbound: to_server_rx,
                outbound: to_client_tx,
            })
            .map_err(|_| TransportError::Refused(self.endpoint()))?;
        Ok(MemoryConnection {
            outbound: to_server_tx,
            inbound: to_client_rx,
        })
    }

    fn endpoint(&self) -> String {
        "memory://loopback".to_string()
    }
}

/// One open loopback connection.
pub struct MemoryConnection {
    outbound: Sender<String>,
    inbound: Receiver<String>,
}

impl Connection for MemoryConnection {
    fn send_text(&mut self, text: &str) -> TransportResult<()> {
        self.outbound
            .send(text.to_owned())
            .map_err(|_| TransportError::Closed)
    }

    fn try_recv_text(&mut self) -> TransportResult<Option<String>> {
        match self.inbound.try_recv() {
            Ok(text) => Ok(Some(text)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TransportError::Closed),
        }
    }

    fn close(&mut self) {
        // Why: the server sees a close only when every sender for the peer is
        // gone, so the live sender is swapped for one with no receiver.
        let (dead_tx, _) = unbounded();
        self.outbound = dead_tx;
    }
}

/// Server side of the loopback.
pub struct MemoryServer {
    link_rx: Receiver<MemoryPeer>,
    peers: Vec<MemoryPeer>,
}

impl MemoryServer {
    /// Accepts pending connections and returns the number of live peers.
    pub fn accept(&mut self) -> usize {
        while let Ok(peer) = self.link_rx.try_recv() {
            self.peers.push(peer);
        }
        self.peers.len()
    }

    /// Total peers accepted so far, including closed ones.
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Sends one message to every accepted peer.
    pub fn broadcast(&mut self, message: &ServerMessage) {
        match encode_server_message(message) {
            Ok(text) => self.broadcast_raw(&text),
            Err(err) => warn!("event=loopback_broadcast module=transport status=error error={err}"),
        }
    }

    /// Sends one raw text frame to every accepted peer.
    pub fn broadcast_raw(&mut self, text: &str) {
        self.accept();
        for peer in &self.peers {
            let _ = peer.outbound.send(text.to_owned());
        }
    }

    /// Drains and decodes everything clients sent, in arrival order per peer.
    pub fn received(&mut self) -> Vec<ClientMessage> {
        self.accept();
        let mut messages = Vec::new();
        for peer in &self.peers {
            while let Ok(text) = peer.inbound.try_recv() {
                match decode_client_message(&text) {
                    Ok(message) => messages.push(message),
                    Err(err) => {
                        warn!("event=loopback_recv module=transport status=skip error={err}")
                    }
                }
            }
        }
        messages
    }

    /// Drops every peer; clients observe a closed connection on next poll.
    pub fn close_all(&mut self) {
        self.accept();
        self.peers.clear();
    }
}
