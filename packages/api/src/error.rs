use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::models::responses::ErrorResponse;
use shared::services::errors::{
    game_service_errors::GameServiceError, room_service_errors::RoomServiceError,
    stats_service_errors::StatsServiceError,
};
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    RoomService(RoomServiceError),
    GameService(GameServiceError),
    StatsService(StatsServiceError),
    Unauthorized,
}

impl From<RoomServiceError> for ApiError {
    fn from(error: RoomServiceError) -> Self {
        ApiError::RoomService(error)
    }
}

impl From<GameServiceError> for ApiError {
    fn from(error: GameServiceError) -> Self {
        ApiError::GameService(error)
    }
}

impl From<StatsServiceError> for ApiError {
    fn from(error: StatsServiceError) -> Self {
        ApiError::StatsService(error)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::RoomService(RoomServiceError::ValidationError(_)) => StatusCode::BAD_REQUEST,
            ApiError::RoomService(RoomServiceError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::RoomService(RoomServiceError::CannotJoinOwnRoom) => StatusCode::BAD_REQUEST,
            ApiError::RoomService(
                RoomServiceError::JoinConflict(_) | RoomServiceError::InvalidState(_),
            ) => StatusCode::CONFLICT,
            ApiError::RoomService(RoomServiceError::NotParticipant(_)) => StatusCode::FORBIDDEN,
            ApiError::RoomService(RoomServiceError::RepositoryError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            ApiError::GameService(GameServiceError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::GameService(GameServiceError::WrongGameType { .. }) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::GameService(GameServiceError::Contention(_)) => StatusCode::CONFLICT,
            ApiError::GameService(GameServiceError::RepositoryError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            ApiError::StatsService(StatsServiceError::ValidationError(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::StatsService(StatsServiceError::RepositoryError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::RoomService(e) => e.to_string(),
            ApiError::GameService(e) => e.to_string(),
            ApiError::StatsService(e) => e.to_string(),
            ApiError::Unauthorized => "Missing caller identity".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            error!("Request failed: {}", message);
            // Storage details stay in the logs.
            let body = ErrorResponse {
                error: "Internal server error".to_string(),
            };
            return (status, Json(body)).into_response();
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
