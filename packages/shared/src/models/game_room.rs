use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::game_state::{GameOutcome, GameState, GameType, IllegalMove, PlayerMove, Seat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Waiting,
    InProgress,
    Completed,
    Cancelled,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::InProgress => "in_progress",
            RoomStatus::Completed => "completed",
            RoomStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RoomStatus::Completed | RoomStatus::Cancelled)
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single two-player match, persisted as one row and shared by both clients.
/// Partition key: `room_id`. Open rooms are listed through a `status`/`created_at` index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRoom {
    pub room_id: String,
    pub game_type: GameType,
    pub player1_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player2_id: Option<String>,
    pub game_state: GameState,
    pub status: RoomStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<String>,
    /// Bumped by every write; moves are only persisted against the version they were derived from.
    pub version: u64,
    /// Sort key of the open-rooms index, so it is stored with a fixed width.
    #[serde(with = "sortable_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// RFC 3339 with all nine fractional digits: the strings compare like the instants.
mod sortable_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Nanos, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

impl GameRoom {
    pub fn new(game_type: GameType, creator_id: &str) -> Self {
        GameRoom {
            room_id: Uuid::new_v4().to_string(),
            game_type,
            player1_id: creator_id.to_string(),
            player2_id: None,
            game_state: GameState::new(game_type),
            status: RoomStatus::Waiting,
            winner_id: None,
            version: 0,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn seat_of(&self, user_id: &str) -> Option<Seat> {
        if self.player1_id == user_id {
            Some(Seat::Player1)
        } else if self.player2_id.as_deref() == Some(user_id) {
            Some(Seat::Player2)
        } else {
            None
        }
    }

    pub fn player_id(&self, seat: Seat) -> Option<&str> {
        match seat {
            Seat::Player1 => Some(self.player1_id.as_str()),
            Seat::Player2 => self.player2_id.as_deref(),
        }
    }

    pub fn is_participant(&self, user_id: &str) -> bool {
        self.seat_of(user_id).is_some()
    }

    /// Listed for matchmaking: still waiting and nobody has claimed the second seat.
    pub fn is_open(&self) -> bool {
        self.status == RoomStatus::Waiting && self.player2_id.is_none()
    }

    /// Winner id implied by the current payload, `None` for a draw or an unfinished game.
    pub fn derived_winner(&self) -> Option<&str> {
        match self.game_state.outcome()? {
            GameOutcome::Winner(seat) => self.player_id(seat),
            GameOutcome::Draw => None,
        }
    }

    /// Whether the persisted status and winner agree with what the payload implies.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            RoomStatus::Waiting => self.player2_id.is_none() && self.winner_id.is_none(),
            RoomStatus::InProgress => {
                self.player2_id.is_some()
                    && self.winner_id.is_none()
                    && self.game_state.outcome().is_none()
            }
            RoomStatus::Completed => {
                self.game_state.outcome().is_some()
                    && self.winner_id.as_deref() == self.derived_winner()
            }
            RoomStatus::Cancelled => self.winner_id.is_none(),
        }
    }

    /// Derives the row that results from `player_id` playing `player_move`.
    ///
    /// Pure: the room itself is left untouched and the returned row carries the
    /// next version, completion status and winner when the move ends the game.
    pub fn with_move(
        &self,
        player_id: &str,
        player_move: &PlayerMove,
        now: DateTime<Utc>,
    ) -> Result<GameRoom, IllegalMove> {
        if self.status != RoomStatus::InProgress {
            return Err(IllegalMove::RoomNotInProgress);
        }
        let seat = self.seat_of(player_id).ok_or(IllegalMove::NotParticipant)?;

        let mut next = self.clone();
        next.game_state.apply(seat, player_move)?;
        next.version += 1;

        if let Some(outcome) = next.game_state.outcome() {
            next.status = RoomStatus::Completed;
            next.completed_at = Some(now);
            next.winner_id = match outcome {
                GameOutcome::Winner(seat) => next.player_id(seat).map(str::to_string),
                GameOutcome::Draw => None,
            };
        }

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::game_state::rock_paper_scissors::Choice;
    use chrono::TimeZone;

    fn started(game_type: GameType) -> GameRoom {
        let mut room = GameRoom::new(game_type, "alice");
        room.player2_id = Some("bob".to_string());
        room.status = RoomStatus::InProgress;
        room.version = 1;
        room
    }

    fn place(room: &GameRoom, player: &str, cell: usize) -> GameRoom {
        room.with_move(player, &PlayerMove::Place { cell }, Utc::now())
            .unwrap()
    }

    #[test]
    fn test_new_room_is_open() {
        let room = GameRoom::new(GameType::TicTacToe, "alice");

        assert_eq!(room.player1_id, "alice");
        assert!(room.player2_id.is_none());
        assert_eq!(room.status, RoomStatus::Waiting);
        assert_eq!(room.game_state.game_type(), GameType::TicTacToe);
        assert!(room.winner_id.is_none());
        assert!(room.completed_at.is_none());
        assert!(room.is_open());
        assert!(room.is_consistent());
    }

    #[test]
    fn test_room_id_uniqueness() {
        let first = GameRoom::new(GameType::TicTacToe, "alice");
        let second = GameRoom::new(GameType::TicTacToe, "alice");

        assert_ne!(first.room_id, second.room_id);
    }

    #[test]
    fn test_seats() {
        let room = started(GameType::TicTacToe);

        assert_eq!(room.seat_of("alice"), Some(Seat::Player1));
        assert_eq!(room.seat_of("bob"), Some(Seat::Player2));
        assert_eq!(room.seat_of("carol"), None);
        assert_eq!(room.player_id(Seat::Player2), Some("bob"));
        assert!(!room.is_open());
    }

    #[test]
    fn test_move_produces_next_version_without_touching_original() {
        let room = started(GameType::TicTacToe);

        let next = place(&room, "alice", 0);

        assert_eq!(next.version, room.version + 1);
        assert_eq!(next.status, RoomStatus::InProgress);
        assert_eq!(room.game_state, GameState::new(GameType::TicTacToe));
        assert!(next.is_consistent());
    }

    #[test]
    fn test_move_rejected_outside_in_progress() {
        let room = GameRoom::new(GameType::TicTacToe, "alice");

        let result = room.with_move("alice", &PlayerMove::Place { cell: 0 }, Utc::now());

        assert_eq!(result, Err(IllegalMove::RoomNotInProgress));
    }

    #[test]
    fn test_move_rejected_for_non_participant() {
        let room = started(GameType::TicTacToe);

        let result = room.with_move("carol", &PlayerMove::Place { cell: 0 }, Utc::now());

        assert_eq!(result, Err(IllegalMove::NotParticipant));
    }

    #[test]
    fn test_winning_move_completes_room() {
        let mut room = started(GameType::TicTacToe);
        for (player, cell) in [("alice", 0), ("bob", 4), ("alice", 1), ("bob", 3)] {
            room = place(&room, player, cell);
        }

        let finished = place(&room, "alice", 2);

        assert_eq!(finished.status, RoomStatus::Completed);
        assert_eq!(finished.winner_id.as_deref(), Some("alice"));
        assert!(finished.completed_at.is_some());
        assert!(finished.is_consistent());
        assert_eq!(
            finished.with_move("bob", &PlayerMove::Place { cell: 8 }, Utc::now()),
            Err(IllegalMove::RoomNotInProgress)
        );
    }

    #[test]
    fn test_draw_completes_room_without_winner() {
        let room = started(GameType::RockPaperScissors);
        let rock = PlayerMove::Choose {
            choice: Choice::Rock,
        };

        let room = room.with_move("bob", &rock, Utc::now()).unwrap();
        assert_eq!(room.status, RoomStatus::InProgress);
        let room = room.with_move("alice", &rock, Utc::now()).unwrap();

        assert_eq!(room.status, RoomStatus::Completed);
        assert!(room.winner_id.is_none());
        assert!(room.is_consistent());
    }

    #[test]
    fn test_inconsistent_rows_are_detected() {
        let mut room = started(GameType::TicTacToe);
        room.status = RoomStatus::Completed;

        assert!(!room.is_consistent());
    }

    #[test]
    fn test_serialization_omits_unset_fields() {
        let room = GameRoom::new(GameType::RockPaperScissors, "alice");

        let serialized = serde_json::to_value(&room).unwrap();

        assert_eq!(serialized["status"], "waiting");
        assert_eq!(serialized["game_type"], "rock_paper_scissors");
        assert_eq!(serialized["game_state"]["game_type"], "rock_paper_scissors");
        assert!(serialized.get("player2_id").is_none());
        assert!(serialized.get("winner_id").is_none());

        let deserialized: GameRoom = serde_json::from_value(serialized).unwrap();
        assert_eq!(deserialized, room);
    }

    #[test]
    fn test_created_at_strings_sort_like_instants() {
        let second = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let earlier = second + chrono::Duration::milliseconds(120);
        let later = second + chrono::Duration::microseconds(120_500);

        let stored: Vec<String> = [earlier, later, second]
            .into_iter()
            .map(|created_at| {
                let mut room = GameRoom::new(GameType::TicTacToe, "alice");
                room.created_at = created_at;
                serde_json::to_value(&room).unwrap()["created_at"]
                    .as_str()
                    .unwrap()
                    .to_string()
            })
            .collect();

        assert_eq!(stored[0], "2026-03-01T12:00:00.120000000Z");
        assert_eq!(stored[2], "2026-03-01T12:00:00.000000000Z");
        assert!(stored[2] < stored[0] && stored[0] < stored[1]);
    }

    #[test]
    fn test_created_at_reads_shorter_timestamps() {
        let mut serialized =
            serde_json::to_value(GameRoom::new(GameType::TicTacToe, "alice")).unwrap();
        serialized["created_at"] = "2026-03-01T12:00:00.12Z".into();

        let room: GameRoom = serde_json::from_value(serialized).unwrap();

        assert_eq!(
            room.created_at,
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
                + chrono::Duration::milliseconds(120)
        );
    }
}
