use serde::{Deserialize, Serialize};

use crate::models::game_room::GameRoom;

#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Result of submitting a move. Ignored moves leave `room` as it was persisted.
#[derive(Debug, Deserialize, Serialize)]
pub struct MoveResponse {
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignored_reason: Option<String>,
    pub room: GameRoom,
}
