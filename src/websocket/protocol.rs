use serde::{Deserialize, Serialize};

use crate::chat::messages::{Coordinates, LocationMessage, SystemMessage, TextMessage};
use crate::chat::router::RoomData;
use crate::error::{ChatError, WebSocketError};

pub const LOCATION_SHARED: &str = "Location shared!";

/// One inbound text frame. `ack` is set when the client wants a reply to
/// this specific request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientFrame {
    #[serde(default)]
    pub ack: Option<u64>,
    pub event: ClientMessage,
}

impl ClientFrame {
    pub fn parse(text: &str) -> Result<Self, WebSocketError> {
        serde_json::from_str(text).map_err(|e| WebSocketError::InvalidFormat(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    #[serde(rename = "join")]
    Join { username: String, room: String },
    #[serde(rename = "sendMessage")]
    SendMessage(String),
    #[serde(rename = "sendLocation")]
    SendLocation(Coordinates),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    #[serde(rename = "systemMessage")]
    SystemMessage(SystemMessage),
    #[serde(rename = "message")]
    Message(TextMessage),
    #[serde(rename = "locationMessage")]
    LocationMessage(LocationMessage),
    #[serde(rename = "roomData")]
    RoomData(RoomData),
    #[serde(rename = "ack")]
    Ack {
        id: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        confirmation: Option<String>,
    },
    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, WebSocketError> {
        serde_json::to_string(self).map_err(|e| WebSocketError::InvalidFormat(e.to_string()))
    }
}

/// Outcome of a request, reported back to the requester exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    Ok,
    Confirmed(String),
    Rejected(ChatError),
}

impl Ack {
    pub fn error(&self) -> Option<&ChatError> {
        match self {
            Ack::Rejected(err) => Some(err),
            _ => None,
        }
    }

    pub fn into_message(self, id: u64) -> ServerMessage {
        let (error, confirmation) = match self {
            Ack::Ok => (None, None),
            Ack::Confirmed(text) => (None, Some(text)),
            Ack::Rejected(err) => (Some(err.to_string()), None),
        };
        ServerMessage::Ack { id, error, confirmation }
    }
}
