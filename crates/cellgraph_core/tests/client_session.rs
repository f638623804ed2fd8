use cellgraph_core::{
    loopback, render_tree, CanvasIntent, Cell, CellId, ClientMessage, ConnectionState, CreateCell,
    DeleteCell, EventSubscriber, GraphStore, MemoryConnector, MemoryServer, MessageKind,
    NotebookClient, NotebookSnapshot, OutputPolicy, ServerMessage, SyncState, TransportAdapter,
    UpdateCell,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn connected_client() -> (NotebookClient<MemoryConnector>, MemoryServer) {
    let (connector, mut server) = loopback();
    let mut client = NotebookClient::new(connector, OutputPolicy::Append);
    assert!(client.connect().unwrap());
    assert_eq!(server.accept(), 1);
    (client, server)
}

/// Echoes every create/delete back the way the notebook server confirms them.
fn confirm_all(server: &mut MemoryServer) {
    for message in server.received() {
        match message {
            ClientMessage::CreateCell(request) => {
                server.broadcast(&ServerMessage::DidCreateCell { request })
            }
            ClientMessage::DeleteCell(request) => {
                server.broadcast(&ServerMessage::DidDeleteCell { request })
            }
            ClientMessage::UpdateCell(request) => {
                server.broadcast(&ServerMessage::DidUpdateCell { request })
            }
            _ => {}
        }
    }
}

#[test]
fn repeated_connect_opens_one_connection() {
    let (connector, mut server) = loopback();
    let mut client = NotebookClient::new(connector, OutputPolicy::Append);

    assert!(client.connect().unwrap());
    assert!(!client.connect().unwrap());
    assert!(!client.connect().unwrap());

    assert_eq!(server.accept(), 1);
    assert_eq!(client.connection_state(), ConnectionState::Connected);
    assert_eq!(client.sync_state(), SyncState::AwaitingHydration);
}

#[test]
fn transport_sends_nothing_before_connect() {
    let (connector, mut server) = loopback();
    let mut adapter = TransportAdapter::new(connector);
    assert!(!adapter.send(&ClientMessage::SaveNotebook));

    adapter.connect().unwrap();
    assert!(adapter.send(&ClientMessage::SaveNotebook));
    assert_eq!(server.received(), vec![ClientMessage::SaveNotebook]);
}

#[test]
fn undecodable_frames_are_skipped_in_order() {
    let (connector, mut server) = loopback();
    let mut adapter = TransportAdapter::new(connector);
    adapter.connect().unwrap();

    server.broadcast_raw("{not json");
    server.broadcast(&ServerMessage::Stdout {
        cell: CellId::from("a"),
        text: "1".to_string(),
    });
    server.broadcast_raw(r#"{"_type":"Brand_New"}"#);

    let outcome = adapter.poll();
    assert_eq!(outcome.skipped, 1);
    assert!(!outcome.disconnected);
    assert_eq!(outcome.messages.len(), 2);
    assert_eq!(outcome.messages[0].kind(), MessageKind::Stdout);
    assert_eq!(outcome.messages[1], ServerMessage::Unknown);
}

#[test]
fn create_without_confirmation_never_materializes() {
    let (mut client, mut server) = connected_client();
    server.broadcast(&ServerMessage::Notebook(NotebookSnapshot::default()));
    client.pump();

    let minted = client.create_cell(None);
    client.pump();

    assert_eq!(client.store().node_count(), 0);
    assert_eq!(
        server.received(),
        vec![ClientMessage::CreateCell(CreateCell {
            cell: minted,
            parent: None,
        })]
    );
}

#[test]
fn confirmed_session_builds_and_prunes_the_tree() {
    let (mut client, mut server) = connected_client();
    server.broadcast(&ServerMessage::Notebook(NotebookSnapshot {
        cells: vec![Cell::new(CellId::from("root"), None)],
    }));
    assert!(client.wait_for_hydration(Duration::from_millis(200), Duration::from_millis(1)));

    let child = client
        .handle_intent(CanvasIntent::Connect {
            parent: Some(CellId::from("root")),
            x: 40.0,
            y: 80.0,
        })
        .unwrap();
    client.handle_intent(CanvasIntent::Edit {
        cell: child.clone(),
        source: "print('hi')".to_string(),
    });
    confirm_all(&mut server);
    server.broadcast(&ServerMessage::Stdout {
        cell: child.clone(),
        text: "hi\n".to_string(),
    });
    client.pump();

    let snapshot = client.snapshot();
    assert_eq!(snapshot.nodes.len(), 2);
    assert_eq!(snapshot.edges.len(), 1);
    let cell = snapshot.node(&child).unwrap();
    assert_eq!(cell.source, "print('hi')");
    assert_eq!(cell.output_text(), "hi\n");

    let tree = render_tree(&snapshot);
    assert!(tree.starts_with("root"));
    assert!(tree.contains(&format!("  {child}")));

    client.delete_cell(CellId::from("root"));
    confirm_all(&mut server);
    client.pump();
    assert_eq!(client.store().node_count(), 1);
    assert_eq!(client.store().edge_count(), 0);
    assert!(client.store().check_edge_invariant().is_consistent());
}

#[test]
fn extra_subscribers_see_events_alongside_builtins() {
    struct DeleteCounter(Arc<AtomicUsize>);

    impl EventSubscriber for DeleteCounter {
        fn name(&self) -> &str {
            "delete-counter"
        }

        fn kinds(&self) -> &[MessageKind] {
            &[MessageKind::DidDeleteCell]
        }

        fn handle(&mut self, _message: &ServerMessage, _store: &mut GraphStore) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let (mut client, mut server) = connected_client();
    let hits = Arc::new(AtomicUsize::new(0));
    client
        .subscribe(Box::new(DeleteCounter(Arc::clone(&hits))))
        .unwrap();

    server.broadcast(&ServerMessage::DidCreateCell {
        request: CreateCell {
            cell: CellId::from("a"),
            parent: None,
        },
    });
    server.broadcast(&ServerMessage::DidDeleteCell {
        request: DeleteCell {
            cell: CellId::from("a"),
        },
    });
    assert_eq!(client.pump(), 2);

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(client.store().node_count(), 0);
}

#[test]
fn drop_and_reconnect_rehydrates() {
    let (mut client, mut server) = connected_client();
    server.broadcast(&ServerMessage::Notebook(NotebookSnapshot {
        cells: vec![Cell::new(CellId::from("a"), None)],
    }));
    client.pump();
    assert_eq!(client.sync_state(), SyncState::Hydrated);

    server.close_all();
    client.pump();
    assert_eq!(client.sync_state(), SyncState::Disconnected);
    assert!(!client.update_cell(CellId::from("a"), "lost"));

    assert!(client.connect().unwrap());
    assert_eq!(client.sync_state(), SyncState::AwaitingHydration);
    server.broadcast(&ServerMessage::Notebook(NotebookSnapshot {
        cells: vec![Cell::new(CellId::from("b"), Some(CellId::from("a")))],
    }));
    client.pump();
    assert_eq!(client.sync_state(), SyncState::Hydrated);
    assert_eq!(client.store().node_count(), 2);
    assert_eq!(client.store().edge_count(), 1);
    assert!(server.received().iter().all(|message| !matches!(
        message,
        ClientMessage::UpdateCell(UpdateCell { .. })
    )));
}

#[test]
fn failed_send_ends_hydration() {
    let (mut client, mut server) = connected_client();
    server.broadcast(&ServerMessage::Notebook(NotebookSnapshot::default()));
    client.pump();
    assert_eq!(client.sync_state(), SyncState::Hydrated);

    server.close_all();
    assert!(!client.save_notebook());
    assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    assert_eq!(client.sync_state(), SyncState::Disconnected);

    client.pump();
    assert_eq!(client.sync_state(), SyncState::Disconnected);
    assert!(!client.wait_for_hydration(Duration::from_millis(20), Duration::from_millis(1)));
}

#[test]
fn poll_reports_a_connection_lost_while_sending() {
    let (connector, mut server) = loopback();
    let mut adapter = TransportAdapter::new(connector);
    adapter.connect().unwrap();
    server.close_all();

    assert!(!adapter.send(&ClientMessage::SaveNotebook));
    assert_eq!(adapter.state(), ConnectionState::Disconnected);
    assert!(adapter.poll().disconnected);
    assert!(!adapter.poll().disconnected);

    adapter.connect().unwrap();
    assert!(!adapter.poll().disconnected);
}
