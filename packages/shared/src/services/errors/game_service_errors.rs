use thiserror::Error;

use crate::models::game_state::GameType;
use crate::repositories::errors::game_room_repository_errors::GameRoomRepositoryError;

#[derive(Debug, Error)]
pub enum GameServiceError {
    #[error("Room {0} not found")]
    NotFound(String),
    #[error("Room {room_id} hosts {expected}, not {requested}")]
    WrongGameType {
        room_id: String,
        expected: GameType,
        requested: GameType,
    },
    #[error("Room {0} kept changing while the move was being applied")]
    Contention(String),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] GameRoomRepositoryError),
}
