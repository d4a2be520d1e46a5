pub mod health;
pub mod rooms;
pub mod stats;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

pub fn app(app_state: AppState) -> Router {
    // TODO: restrict origins once the web client's domain is known
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .merge(rooms::routes())
        .merge(stats::routes())
        .layer(cors)
        .with_state(app_state)
}
