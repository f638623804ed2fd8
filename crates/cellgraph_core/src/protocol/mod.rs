//! Wire protocol between the notebook client and server.
//!
//! # Responsibility
//! - Define the closed set of client→server and server→client messages.
//! - Encode/decode JSON text frames with the `_type` discriminant.
//!
//! # Invariants
//! - No validation beyond shape happens here.
//! - Unknown discriminants decode to `ServerMessage::Unknown` instead of failing.

pub mod codec;
pub mod message;

pub use codec::{
    decode_client_message, decode_server_message, encode_client_message, encode_server_message,
    message_type_of, ProtocolError,
};
pub use message::{
    ClientMessage, CreateCell, DeleteCell, MessageKind, MoveCell, NotebookSnapshot, RunCell,
    ServerMessage, UpdateCell,
};
