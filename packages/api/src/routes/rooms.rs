use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::{error::ApiError, middleware::auth::AuthenticatedUser, state::AppState};
use shared::models::{
    game_room::GameRoom,
    requests::{CreateRoomRequest, RockPaperScissorsChoiceRequest, TicTacToeMoveRequest},
    responses::MoveResponse,
};
use shared::services::game_service::MoveOutcome;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/open", get(list_open_rooms))
        .route("/rooms/{room_id}", get(get_room))
        .route("/rooms/{room_id}/join", post(join_room))
        .route("/rooms/{room_id}/cancel", post(cancel_room))
        .route("/rooms/{room_id}/tic-tac-toe/moves", post(play_tic_tac_toe))
        .route(
            "/rooms/{room_id}/rock-paper-scissors/choice",
            post(make_choice),
        )
}

async fn create_room(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<GameRoom>), ApiError> {
    let room = state
        .room_service
        .create_room(payload.game_type, &authenticated_user.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(room)))
}

async fn list_open_rooms(State(state): State<AppState>) -> Result<Json<Vec<GameRoom>>, ApiError> {
    let rooms = state.room_service.list_open_rooms().await?;
    Ok(Json(rooms))
}

async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<GameRoom>, ApiError> {
    let room = state.room_service.get_room(&room_id).await?;
    Ok(Json(room))
}

async fn join_room(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(room_id): Path<String>,
) -> Result<Json<GameRoom>, ApiError> {
    let room = state
        .room_service
        .join_room(&room_id, &authenticated_user.user_id)
        .await?;
    Ok(Json(room))
}

async fn cancel_room(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(room_id): Path<String>,
) -> Result<Json<GameRoom>, ApiError> {
    let room = state
        .room_service
        .cancel_room(&room_id, &authenticated_user.user_id)
        .await?;
    Ok(Json(room))
}

async fn play_tic_tac_toe(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(room_id): Path<String>,
    Json(payload): Json<TicTacToeMoveRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    let outcome = state
        .game_service
        .play_tic_tac_toe(&room_id, &authenticated_user.user_id, payload.cell)
        .await?;
    Ok(Json(move_response(outcome)))
}

async fn make_choice(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(room_id): Path<String>,
    Json(payload): Json<RockPaperScissorsChoiceRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    let outcome = state
        .game_service
        .make_choice(&room_id, &authenticated_user.user_id, payload.choice)
        .await?;
    Ok(Json(move_response(outcome)))
}

// Ignored moves are a normal answer, not an error status.
fn move_response(outcome: MoveOutcome) -> MoveResponse {
    match outcome {
        MoveOutcome::Applied(room) => MoveResponse {
            accepted: true,
            ignored_reason: None,
            room,
        },
        MoveOutcome::Ignored { reason, room } => MoveResponse {
            accepted: false,
            ignored_reason: Some(reason.to_string()),
            room,
        },
    }
}
