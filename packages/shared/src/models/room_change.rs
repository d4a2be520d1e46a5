use serde::{Deserialize, Serialize};

use crate::models::game_room::{GameRoom, RoomStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomChangeKind {
    Inserted,
    Updated,
}

/// A row-level change to a room, as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomChange {
    pub kind: RoomChangeKind,
    pub room: GameRoom,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<GameRoom>,
}

impl RoomChange {
    pub fn inserted(room: GameRoom) -> Self {
        RoomChange {
            kind: RoomChangeKind::Inserted,
            room,
            previous: None,
        }
    }

    pub fn updated(previous: Option<GameRoom>, room: GameRoom) -> Self {
        RoomChange {
            kind: RoomChangeKind::Updated,
            room,
            previous,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room.room_id
    }

    /// True when this change moved the room into `completed`.
    pub fn completed_transition(&self) -> bool {
        self.room.status == RoomStatus::Completed
            && self
                .previous
                .as_ref()
                .map_or(true, |previous| previous.status != RoomStatus::Completed)
    }

    /// True when the room entered or left the open-room list.
    pub fn affects_open_rooms(&self) -> bool {
        self.room.is_open() || self.previous.as_ref().is_some_and(GameRoom::is_open)
    }
}
