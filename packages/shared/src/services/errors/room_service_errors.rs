use thiserror::Error;

use crate::repositories::errors::game_room_repository_errors::GameRoomRepositoryError;

#[derive(Debug, Error)]
pub enum RoomServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Room {0} not found")]
    NotFound(String),
    #[error("Cannot join a room you created")]
    CannotJoinOwnRoom,
    #[error("Room {0} is no longer available")]
    JoinConflict(String),
    #[error("Caller is not a participant of room {0}")]
    NotParticipant(String),
    #[error("Invalid room state: {0}")]
    InvalidState(String),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] GameRoomRepositoryError),
}
