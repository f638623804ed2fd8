use cellgraph_core::protocol::{
    decode_client_message, decode_server_message, encode_client_message, encode_server_message,
};
use cellgraph_core::{
    Cell, CellId, CellOutput, ClientMessage, CreateCell, DeleteCell, MoveCell, NotebookSnapshot,
    Position, RunCell, ServerMessage, UpdateCell,
};
use serde_json::{json, Value};

fn id(value: &str) -> CellId {
    CellId::from(value)
}

fn to_value(message: &ClientMessage) -> Value {
    serde_json::from_str(&encode_client_message(message).unwrap()).unwrap()
}

#[test]
fn client_messages_use_flat_type_tag() {
    assert_eq!(
        to_value(&ClientMessage::SaveNotebook),
        json!({"_type": "SaveNotebook"})
    );
    assert_eq!(
        to_value(&ClientMessage::CreateCell(CreateCell {
            cell: id("n1"),
            parent: None,
        })),
        json!({"_type": "CreateCell", "cell": "n1", "parent": null})
    );
    assert_eq!(
        to_value(&ClientMessage::UpdateCell(UpdateCell {
            cell: id("n1"),
            source: "print(1)".to_string(),
        })),
        json!({"_type": "UpdateCell", "cell": "n1", "source": "print(1)"})
    );
    assert_eq!(
        to_value(&ClientMessage::MoveCell(MoveCell {
            cell: id("n1"),
            x: 10.5,
            y: -2.0,
        })),
        json!({"_type": "MoveCell", "cell": "n1", "x": 10.5, "y": -2.0})
    );
}

#[test]
fn server_confirmations_nest_the_original_request() {
    let message = decode_server_message(
        r#"{"_type":"DidCreateCell","request":{"_type":"CreateCell","cell":"b","parent":"a"}}"#,
    )
    .unwrap();
    assert_eq!(
        message,
        ServerMessage::DidCreateCell {
            request: CreateCell {
                cell: id("b"),
                parent: Some(id("a")),
            },
        }
    );

    let message =
        decode_server_message(r#"{"_type":"DidDeleteCell","request":{"cell":"b"}}"#).unwrap();
    assert_eq!(
        message,
        ServerMessage::DidDeleteCell {
            request: DeleteCell { cell: id("b") },
        }
    );
}

#[test]
fn snapshot_decodes_minimal_and_rich_entries() {
    let message = decode_server_message(
        r#"{"_type":"Notebook","cells":[
            {"id":"a","parent":null},
            {"id":"b","parent":"a","source":"x = 1",
             "outputs":[{"type":"text","data":"1\n"}],
             "position":{"x":3.0,"y":4.0}}
        ]}"#,
    )
    .unwrap();

    let ServerMessage::Notebook(snapshot) = message else {
        panic!("expected Notebook");
    };
    assert_eq!(snapshot.cells.len(), 2);
    assert_eq!(snapshot.cells[0], Cell::new(id("a"), None));
    assert_eq!(snapshot.cells[1].source, "x = 1");
    assert_eq!(snapshot.cells[1].outputs, vec![CellOutput::text("1\n")]);
    assert_eq!(snapshot.cells[1].position, Position::new(3.0, 4.0));
}

#[test]
fn every_message_kind_survives_encode_decode() {
    let client = vec![
        ClientMessage::SaveNotebook,
        ClientMessage::CreateCell(CreateCell {
            cell: id("b"),
            parent: Some(id("a")),
        }),
        ClientMessage::DeleteCell(DeleteCell { cell: id("b") }),
        ClientMessage::UpdateCell(UpdateCell {
            cell: id("b"),
            source: "print('hi')\n".to_string(),
        }),
        ClientMessage::RunCell(RunCell { cell: id("b") }),
        ClientMessage::MoveCell(MoveCell {
            cell: id("b"),
            x: 1.25,
            y: 2.5,
        }),
    ];
    for message in client {
        let text = encode_client_message(&message).unwrap();
        assert_eq!(decode_client_message(&text).unwrap(), message);
    }

    let mut rich = Cell::new(id("b"), Some(id("a")));
    rich.source = "print('hi')".to_string();
    rich.outputs.push(CellOutput::text("hi\n"));
    let server = vec![
        ServerMessage::Notebook(NotebookSnapshot {
            cells: vec![Cell::new(id("a"), None), rich],
        }),
        ServerMessage::DidCreateCell {
            request: CreateCell {
                cell: id("b"),
                parent: None,
            },
        },
        ServerMessage::DidDeleteCell {
            request: DeleteCell { cell: id("b") },
        },
        ServerMessage::DidUpdateCell {
            request: UpdateCell {
                cell: id("b"),
                source: "y = 2".to_string(),
            },
        },
        ServerMessage::DidRunCell {
            request: RunCell { cell: id("b") },
        },
        ServerMessage::Stdout {
            cell: id("b"),
            text: "partial".to_string(),
        },
    ];
    for message in server {
        let text = encode_server_message(&message).unwrap();
        assert_eq!(decode_server_message(&text).unwrap(), message);
    }
}
