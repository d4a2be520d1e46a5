use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::{
    models::{
        game_room::GameRoom,
        game_state::{rock_paper_scissors::Choice, IllegalMove, PlayerMove},
    },
    repositories::game_room_repository::GameRoomRepository,
    services::errors::game_service_errors::GameServiceError,
};

/// How many times a move is re-derived after losing the version guard.
pub const MOVE_CONFLICT_RETRIES: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// The move was persisted; `GameRoom` is the row as written.
    Applied(GameRoom),
    /// Nothing was written. `room` is the row the move was checked against.
    Ignored { reason: IllegalMove, room: GameRoom },
}

impl MoveOutcome {
    pub fn room(&self) -> &GameRoom {
        match self {
            MoveOutcome::Applied(room) => room,
            MoveOutcome::Ignored { room, .. } => room,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, MoveOutcome::Applied(_))
    }
}

/// Runs the per-game state machines against the persisted row.
#[derive(Clone)]
pub struct GameService {
    repository: Arc<dyn GameRoomRepository + Send + Sync>,
}

impl GameService {
    pub fn new(repository: Arc<dyn GameRoomRepository + Send + Sync>) -> Self {
        GameService { repository }
    }

    /// Current row of `room_id`.
    pub async fn get_room(&self, room_id: &str) -> Result<GameRoom, GameServiceError> {
        self.repository
            .get_room(room_id)
            .await?
            .ok_or_else(|| GameServiceError::NotFound(room_id.to_string()))
    }

    pub async fn play_tic_tac_toe(
        &self,
        room_id: &str,
        player_id: &str,
        cell: usize,
    ) -> Result<MoveOutcome, GameServiceError> {
        self.submit(room_id, player_id, PlayerMove::Place { cell })
            .await
    }

    pub async fn make_choice(
        &self,
        room_id: &str,
        player_id: &str,
        choice: Choice,
    ) -> Result<MoveOutcome, GameServiceError> {
        self.submit(room_id, player_id, PlayerMove::Choose { choice })
            .await
    }

    /// Applies `player_move` to the freshest row and writes it back guarded by
    /// the version it was derived from. When another write lands first the
    /// move is derived again from the new row, so a second RPS choice always
    /// sees the first one.
    pub async fn submit(
        &self,
        room_id: &str,
        player_id: &str,
        player_move: PlayerMove,
    ) -> Result<MoveOutcome, GameServiceError> {
        for attempt in 0..=MOVE_CONFLICT_RETRIES {
            let room = self
                .repository
                .get_room(room_id)
                .await?
                .ok_or_else(|| GameServiceError::NotFound(room_id.to_string()))?;

            if room.game_type != player_move.game_type() {
                return Err(GameServiceError::WrongGameType {
                    room_id: room_id.to_string(),
                    expected: room.game_type,
                    requested: player_move.game_type(),
                });
            }

            let next = match room.with_move(player_id, &player_move, Utc::now()) {
                Ok(next) => next,
                Err(reason) => {
                    info!(
                        "Ignored move {:?} by {} in room {}: {}",
                        player_move, player_id, room_id, reason
                    );
                    return Ok(MoveOutcome::Ignored { reason, room });
                }
            };

            if self.repository.replace_room(&next, room.version).await? {
                if next.status.is_terminal() {
                    info!(
                        "Room {} completed, winner: {}",
                        room_id,
                        next.winner_id.as_deref().unwrap_or("none")
                    );
                }
                return Ok(MoveOutcome::Applied(next));
            }

            warn!(
                "Room {} moved past version {} (attempt {}), re-deriving move by {}",
                room_id,
                room.version,
                attempt + 1,
                player_id
            );
        }

        Err(GameServiceError::Contention(room_id.to_string()))
    }
}
