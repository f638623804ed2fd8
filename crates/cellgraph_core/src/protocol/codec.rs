//! JSON text-frame codec.

use crate::protocol::message::{ClientMessage, ServerMessage};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Codec failures.
#[derive(Debug)]
pub enum ProtocolError {
    /// Value could not be serialized.
    Encode(serde_json::Error),
    /// Frame is not valid JSON or does not match the shape of its `_type`.
    Decode(serde_json::Error),
}

impl Display for ProtocolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode message: {err}"),
            Self::Decode(err) => write!(f, "failed to decode message: {err}"),
        }
    }
}

impl Error for ProtocolError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) | Self::Decode(err) => Some(err),
        }
    }
}

pub fn encode_client_message(message: &ClientMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(ProtocolError::Encode)
}

pub fn decode_client_message(text: &str) -> Result<ClientMessage, ProtocolError> {
    serde_json::from_str(text).map_err(ProtocolError::Decode)
}

pub fn encode_server_message(message: &ServerMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(ProtocolError::Encode)
}

/// Decodes one inbound frame.
///
/// Unknown `_type` values yield `ServerMessage::Unknown`; a missing `_type`
/// or a known `_type` with the wrong shape is a decode error.
pub fn decode_server_message(text: &str) -> Result<ServerMessage, ProtocolError> {
    serde_json::from_str(text).map_err(ProtocolError::Decode)
}

/// Best-effort read of the raw `_type` field, for diagnostics only.
pub fn message_type_of(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    value.get("_type")?.as_str().map(str::to_owned)
}
