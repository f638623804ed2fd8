//! Command-line client for a running notebook server.
//!
//! # Responsibility
//! - Connect, hydrate, optionally issue one command, and print the tree.
//! - Keep output deterministic for quick local sanity checks.

use anyhow::{bail, Context, Result};
use cellgraph_core::{
    init_stderr_logging, render_tree, CellId, ClientConfig, NotebookClient, WsConnector,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

const PUMP_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Parser, Debug)]
#[command(name = "cellgraph", version, about = "Graph notebook sync client")]
struct Cli {
    /// TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides `server_url`.
    #[arg(long)]
    url: Option<String>,
    /// Overrides `log_level`.
    #[arg(long)]
    log_level: Option<String>,
    /// How long to wait for the snapshot and for confirmations.
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the notebook tree (default).
    Tree,
    /// Create a cell, optionally under a parent.
    Create {
        #[arg(long)]
        parent: Option<String>,
    },
    Delete { cell: String },
    Update { cell: String, source: String },
    /// Run a cell and print its output once the run is confirmed.
    Run { cell: String },
    Save,
    /// Print the core version and exit.
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if matches!(cli.command, Some(Command::Version)) {
        println!("cellgraph_core ping={}", cellgraph_core::ping());
        println!("cellgraph_core version={}", cellgraph_core::core_version());
        return Ok(());
    }

    let config = load_config(&cli)?;
    init_stderr_logging(&config.log_level).map_err(anyhow::Error::msg)?;

    let timeout = Duration::from_millis(cli.timeout_ms);
    let mut client = NotebookClient::from_config(&config);
    client
        .connect()
        .with_context(|| format!("failed to connect to {}", config.server_url))?;
    if !client.wait_for_hydration(timeout, PUMP_INTERVAL) {
        bail!("no notebook snapshot within {} ms", cli.timeout_ms);
    }

    match cli.command.unwrap_or(Command::Tree) {
        Command::Tree | Command::Version => {}
        Command::Create { parent } => {
            let cell = client.create_cell(parent.map(CellId::from));
            settle(&mut client, timeout, |client| client.store().contains_node(&cell));
            println!("created {cell}");
        }
        Command::Delete { cell } => {
            let cell = CellId::from(cell);
            client.delete_cell(cell.clone());
            settle(&mut client, timeout, |client| !client.store().contains_node(&cell));
        }
        Command::Update { cell, source } => {
            let cell = CellId::from(cell);
            client.update_cell(cell.clone(), source.clone());
            settle(&mut client, timeout, |client| {
                client
                    .store()
                    .node(&cell)
                    .is_some_and(|entry| entry.source == source)
            });
        }
        Command::Run { cell } => {
            let cell = CellId::from(cell);
            if !client.run_cell(cell.clone()) {
                bail!("run request for {cell} was not sent");
            }
            settle(&mut client, timeout, |client| {
                client.store().node(&cell).is_some_and(|entry| !entry.running)
            });
            if let Some(entry) = client.store().node(&cell) {
                print!("{}", entry.output_text());
            }
        }
        Command::Save => {
            client.save_notebook();
        }
    }

    print!("{}", render_tree(&client.snapshot()));
    client.disconnect();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(url) = &cli.url {
        config.server_url.clone_from(url);
    }
    if let Some(level) = &cli.log_level {
        config.log_level.clone_from(level);
    }
    config.validate()?;
    Ok(config)
}

/// Pumps until `done` holds or `timeout` elapses.
fn settle(
    client: &mut NotebookClient<WsConnector>,
    timeout: Duration,
    done: impl Fn(&NotebookClient<WsConnector>) -> bool,
) {
    let deadline = std::time::Instant::now() + timeout;
    while !done(client) && std::time::Instant::now() < deadline {
        client.pump();
        std::thread::sleep(PUMP_INTERVAL);
    }
    if !done(client) {
        log::warn!("event=cli_settle module=cli status=error reason=timeout");
    }
}
