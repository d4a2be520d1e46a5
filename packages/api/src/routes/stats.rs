use axum::{extract::State, routing::get, Json, Router};

use crate::{error::ApiError, middleware::auth::AuthenticatedUser, state::AppState};
use shared::models::player_stats::PlayerStats;

pub fn routes() -> Router<AppState> {
    Router::new().route("/stats/me", get(get_my_stats))
}

async fn get_my_stats(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<Json<PlayerStats>, ApiError> {
    let stats = state
        .stats_service
        .get_stats(&authenticated_user.user_id)
        .await?;
    Ok(Json(stats))
}
