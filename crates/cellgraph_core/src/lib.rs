//! Client-side sync engine for graph notebooks.
//! Mirrors the server's cell tree into a local node/edge graph.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod logging;
pub mod model;
pub mod protocol;
pub mod reconcile;
pub mod store;
pub mod transport;

pub use client::NotebookClient;
pub use config::{ClientConfig, ConfigError, ConfigResult, OutputPolicy, DEFAULT_SERVER_URL};
pub use dispatch::{CanvasIntent, CommandDispatcher, MessageSink};
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget,
};
pub use model::cell::{Cell, CellId, CellOutput, Position};
pub use model::edge::{Edge, EdgeId};
pub use protocol::{
    ClientMessage, CreateCell, DeleteCell, MessageKind, MoveCell, NotebookSnapshot,
    ProtocolError, RunCell, ServerMessage, UpdateCell,
};
pub use reconcile::{EventRouter, EventSubscriber, Reconciler, RouterError, SyncState};
pub use store::{render_tree, EdgeInvariantReport, GraphSnapshot, GraphStore};
pub use transport::{
    loopback, ConnectionState, Connector, MemoryConnector, MemoryServer, TransportAdapter,
    TransportError, TransportResult, WsConnector,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
