use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Frames a client can send on the `$default` route.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    /// `topic` is `open_rooms` or `room#<room_id>`.
    Subscribe { topic: String },
    Unsubscribe { topic: String },
    Ping,
}

/// Direct replies to a client frame. Room changes are pushed separately.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServerMessage {
    Subscribed { topic: String },
    Unsubscribed { topic: String },
    Pong { timestamp: String },
    Error { message: String, timestamp: String },
}

impl ServerMessage {
    pub fn pong() -> Self {
        ServerMessage::Pong {
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
