use thiserror::Error;

use crate::services::errors::game_service_errors::GameServiceError;
use crate::services::errors::stats_service_errors::StatsServiceError;

#[derive(Debug, Error)]
pub enum RoomSessionError {
    #[error("Room {0} is not hosting a game for this participant")]
    NotParticipant(String),
    #[error("Change feed closed before room {0} finished")]
    FeedClosed(String),
    #[error(transparent)]
    Game(#[from] GameServiceError),
    #[error(transparent)]
    Stats(#[from] StatsServiceError),
}
