//! FFI use-case API for the canvas front end.
//!
//! # Responsibility
//! - Expose the notebook client to Dart via FRB as flat, sync calls.
//! - Own the single process-wide client session.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Commands issued without a live session fail with a message; they never
//!   create a session implicitly.
//! - The front end drives inbound processing by calling `client_pump`.

use cellgraph_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CellId, ClientConfig, ConnectionState, GraphSnapshot, NotebookClient, OutputPolicy,
    WsConnector,
};
use log::info;
use once_cell::sync::Lazy;
use std::sync::Mutex;

static SESSION: Lazy<Mutex<Option<NotebookClient<WsConnector>>>> = Lazy::new(|| Mutex::new(None));

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One cell as seen by the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct FfiCell {
    pub id: String,
    pub parent: Option<String>,
    pub source: String,
    /// Concatenated text outputs, in arrival order.
    pub output: String,
    pub x: f64,
    pub y: f64,
    pub running: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfiEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// Render-ready graph view.
#[derive(Debug, Clone, PartialEq)]
pub struct FfiGraph {
    /// Bumped on every applied update; unchanged means nothing to redraw.
    pub revision: u64,
    /// `disconnected|awaiting_hydration|hydrated`.
    pub sync_state: String,
    pub cells: Vec<FfiCell>,
    pub edges: Vec<FfiEdge>,
}

/// Command result envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfiActionResponse {
    /// Whether the command was handed to an open connection.
    pub ok: bool,
    /// Client-minted id for create commands.
    pub cell_id: Option<String>,
    pub message: String,
}

impl FfiActionResponse {
    fn from_sent(sent: bool, action: &str) -> Self {
        if sent {
            Self {
                ok: true,
                cell_id: None,
                message: format!("{action} sent."),
            }
        } else {
            Self::failure(format!("{action} dropped: not connected"))
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            cell_id: None,
            message: message.into(),
        }
    }
}

/// Opens the process-wide session against `server_url`.
///
/// Input semantics:
/// - `output_policy`: `append` or `clear_on_run`; empty means `append`.
///
/// # FFI contract
/// - Sync call; blocks for the WebSocket handshake.
/// - Calling again while connected is a no-op.
/// - A disconnected session with another URL or policy is replaced.
/// - A session whose first connect fails is not kept.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn client_connect(server_url: String, output_policy: String) -> String {
    let config = match build_config(server_url, output_policy) {
        Ok(config) => config,
        Err(err) => return err,
    };

    let mut guard = match SESSION.lock() {
        Ok(guard) => guard,
        Err(_) => return "client session lock poisoned".to_string(),
    };
    match connect_session(&mut guard, &config) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

fn connect_session(
    slot: &mut Option<NotebookClient<WsConnector>>,
    config: &ClientConfig,
) -> Result<(), String> {
    let fresh = prepare_session(slot, config);
    let Some(session) = slot.as_mut() else {
        return Err("client session missing".to_string());
    };
    match session.connect() {
        Ok(_) => Ok(()),
        Err(err) => {
            if fresh {
                *slot = None;
            }
            Err(format!("client_connect failed: {err}"))
        }
    }
}

/// Ensures `slot` holds a session for `config`. Returns whether it was rebuilt.
fn prepare_session(slot: &mut Option<NotebookClient<WsConnector>>, config: &ClientConfig) -> bool {
    let reusable = slot.as_ref().is_some_and(|session| {
        session.connection_state() != ConnectionState::Disconnected
            || (session.endpoint() == config.server_url
                && session.output_policy() == config.output_policy)
    });
    if reusable {
        return false;
    }
    if let Some(stale) = slot.as_ref() {
        info!(
            "event=ffi_session_rebuild module=ffi status=ok previous_endpoint={}",
            stale.endpoint()
        );
    }
    *slot = Some(NotebookClient::from_config(config));
    true
}

/// Closes and forgets the session.
#[flutter_rust_bridge::frb(sync)]
pub fn client_disconnect() -> String {
    match SESSION.lock() {
        Ok(mut guard) => {
            if let Some(mut session) = guard.take() {
                session.disconnect();
                info!("event=ffi_disconnect module=ffi status=ok");
            }
            String::new()
        }
        Err(_) => "client session lock poisoned".to_string(),
    }
}

/// Applies pending server events; returns how many were applied.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Returns 0 without a session.
#[flutter_rust_bridge::frb(sync)]
pub fn client_pump() -> u32 {
    with_session(|session| session.pump())
        .map(|applied| u32::try_from(applied).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Current graph for rendering. Empty without a session.
#[flutter_rust_bridge::frb(sync)]
pub fn graph_snapshot() -> FfiGraph {
    with_session(|session| to_ffi_graph(&session.snapshot(), session.sync_state().as_str()))
        .unwrap_or_else(|_| FfiGraph {
            revision: 0,
            sync_state: "disconnected".to_string(),
            cells: Vec::new(),
            edges: Vec::new(),
        })
}

/// Requests a new cell, optionally under `parent_id`.
///
/// The returned id appears in `graph_snapshot` only after the server confirms.
#[flutter_rust_bridge::frb(sync)]
pub fn create_cell(parent_id: Option<String>) -> FfiActionResponse {
    let parent = parent_id
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(CellId::from);
    match with_session(|session| {
        let connected = session.connection_state() == ConnectionState::Connected;
        (session.create_cell(parent), connected)
    }) {
        Ok((cell, true)) => FfiActionResponse {
            ok: true,
            cell_id: Some(cell.to_string()),
            message: "create_cell sent.".to_string(),
        },
        Ok((_, false)) => FfiActionResponse::failure("create_cell dropped: not connected"),
        Err(err) => FfiActionResponse::failure(err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn delete_cell(cell_id: String) -> FfiActionResponse {
    command("delete_cell", |session| {
        session.delete_cell(CellId::from(cell_id))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn update_cell(cell_id: String, source: String) -> FfiActionResponse {
    command("update_cell", |session| {
        session.update_cell(CellId::from(cell_id), source)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn run_cell(cell_id: String) -> FfiActionResponse {
    command("run_cell", |session| session.run_cell(CellId::from(cell_id)))
}

/// Sends one drag tick; the position is echoed locally right away.
#[flutter_rust_bridge::frb(sync)]
pub fn move_cell(cell_id: String, x: f64, y: f64) -> FfiActionResponse {
    command("move_cell", |session| {
        session.move_cell(CellId::from(cell_id), x, y)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn save_notebook() -> FfiActionResponse {
    command("save_notebook", |session| session.save_notebook())
}

/// Local-only output reset. Fails when the cell is unknown.
#[flutter_rust_bridge::frb(sync)]
pub fn clear_outputs(cell_id: String) -> FfiActionResponse {
    match with_session(|session| session.clear_outputs(&CellId::from(cell_id.as_str()))) {
        Ok(true) => FfiActionResponse {
            ok: true,
            cell_id: Some(cell_id),
            message: "Outputs cleared.".to_string(),
        },
        Ok(false) => FfiActionResponse::failure(format!("unknown cell: {cell_id}")),
        Err(err) => FfiActionResponse::failure(err),
    }
}

fn build_config(server_url: String, output_policy: String) -> Result<ClientConfig, String> {
    let output_policy = match output_policy.trim() {
        "" | "append" => OutputPolicy::Append,
        "clear_on_run" => OutputPolicy::ClearOnRun,
        other => return Err(format!("unsupported output_policy `{other}`")),
    };
    let config = ClientConfig {
        server_url: server_url.trim().to_string(),
        output_policy,
        ..ClientConfig::default()
    };
    config.validate().map_err(|err| err.to_string())?;
    Ok(config)
}

fn with_session<R>(
    f: impl FnOnce(&mut NotebookClient<WsConnector>) -> R,
) -> Result<R, String> {
    let mut guard = SESSION
        .lock()
        .map_err(|_| "client session lock poisoned".to_string())?;
    let session = guard
        .as_mut()
        .ok_or_else(|| "no client session; call client_connect first".to_string())?;
    Ok(f(session))
}

fn command(
    action: &str,
    f: impl FnOnce(&mut NotebookClient<WsConnector>) -> bool,
) -> FfiActionResponse {
    match with_session(f) {
        Ok(sent) => FfiActionResponse::from_sent(sent, action),
        Err(err) => FfiActionResponse::failure(format!("{action} failed: {err}")),
    }
}

fn to_ffi_graph(snapshot: &GraphSnapshot, sync_state: &str) -> FfiGraph {
    FfiGraph {
        revision: snapshot.revision,
        sync_state: sync_state.to_string(),
        cells: snapshot
            .nodes
            .iter()
            .map(|cell| FfiCell {
                id: cell.id.to_string(),
                parent: cell.parent.as_ref().map(ToString::to_string),
                source: cell.source.clone(),
                output: cell.output_text(),
                x: cell.position.x,
                y: cell.position.y,
                running: cell.running,
            })
            .collect(),
        edges: snapshot
            .edges
            .iter()
            .map(|edge| FfiEdge {
                id: edge.id.as_str().to_string(),
                source: edge.source.to_string(),
                target: edge.target.to_string(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        build_config, connect_session, core_version, delete_cell, graph_snapshot, init_logging,
        ping, prepare_session, to_ffi_graph,
    };
    use cellgraph_core::{Cell, CellId, CellOutput, GraphStore, NotebookSnapshot, Reconciler};
    use cellgraph_core::{ClientConfig, NotebookClient, OutputPolicy, ServerMessage};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_relative_log_dir() {
        let error = init_logging("info".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn build_config_validates_inputs() {
        let config = build_config(" ws://127.0.0.1:8000/ ".to_string(), "clear_on_run".to_string())
            .expect("valid inputs");
        assert_eq!(config.server_url, "ws://127.0.0.1:8000/");
        assert_eq!(config.output_policy, OutputPolicy::ClearOnRun);

        assert!(build_config("http://x/".to_string(), String::new()).is_err());
        assert!(build_config("ws://x/".to_string(), "replace".to_string()).is_err());
    }

    #[test]
    fn commands_without_session_fail_cleanly() {
        let response = delete_cell("a".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("client_connect"));
        assert_eq!(graph_snapshot().sync_state, "disconnected");
    }

    #[test]
    fn graph_projection_flattens_cells_and_edges() {
        let mut store = GraphStore::new();
        let mut reconciler = Reconciler::new();
        let mut child = Cell::new(CellId::from("b"), Some(CellId::from("a")));
        child.outputs.push(CellOutput::text("1\n"));
        child.outputs.push(CellOutput::text("2\n"));
        reconciler.apply(
            &ServerMessage::Notebook(NotebookSnapshot {
                cells: vec![Cell::new(CellId::from("a"), None), child],
            }),
            &mut store,
        );

        let graph = to_ffi_graph(&store.snapshot(), reconciler.state().as_str());
        assert_eq!(graph.sync_state, "hydrated");
        assert_eq!(graph.cells.len(), 2);
        assert_eq!(graph.cells[1].output, "1\n2\n");
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].id, "a_b");
    }

    #[test]
    fn disconnected_session_follows_new_config() {
        let first = build_config("ws://127.0.0.1:1/".to_string(), String::new())
            .expect("valid first config");
        let second = build_config("ws://127.0.0.1:2/".to_string(), "clear_on_run".to_string())
            .expect("valid second config");
        let mut slot = Some(NotebookClient::from_config(&first));

        assert!(prepare_session(&mut slot, &second));
        let session = slot.as_ref().expect("session kept");
        assert_eq!(session.endpoint(), "ws://127.0.0.1:2/");
        assert_eq!(session.output_policy(), OutputPolicy::ClearOnRun);

        assert!(!prepare_session(&mut slot, &second));
    }

    #[test]
    fn refused_first_connect_leaves_no_session() {
        let config = ClientConfig {
            server_url: "ws://127.0.0.1:1/".to_string(),
            ..ClientConfig::default()
        };
        let mut slot = None;
        let error = connect_session(&mut slot, &config).expect_err("port 1 should refuse");
        assert!(error.contains("client_connect failed"));
        assert!(slot.is_none());
    }
}
