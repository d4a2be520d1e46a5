use thiserror::Error;

use crate::repositories::errors::player_stats_repository_errors::PlayerStatsRepositoryError;

#[derive(Debug, Error)]
pub enum StatsServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] PlayerStatsRepositoryError),
}
