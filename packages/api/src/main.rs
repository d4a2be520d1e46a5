use lambda_http::{run, Error};
use std::env::set_var;
use std::sync::Arc;
use tracing::info;

use api::{routes, state::AppState};
use shared::config::Config;
use shared::repositories::game_room_repository::DynamoDbGameRoomRepository;
use shared::repositories::player_stats_repository::DynamoDbPlayerStatsRepository;

#[tokio::main]
async fn main() -> Result<(), Error> {
    set_var("AWS_LAMBDA_HTTP_IGNORE_STAGE_IN_PATH", "true");

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let config = Config::from_env()?;
    let aws_config = aws_config::load_from_env().await;
    let client = aws_sdk_dynamodb::Client::new(&aws_config);

    let room_repository = Arc::new(DynamoDbGameRoomRepository::new(
        client.clone(),
        &config.game_rooms_table,
    ));
    let stats_repository = Arc::new(DynamoDbPlayerStatsRepository::new(
        client,
        &config.player_stats_table,
    ));

    let app_state = AppState::new(
        room_repository,
        stats_repository,
        config.open_rooms_page_size,
    );

    info!("Serving rooms from {}", config.game_rooms_table);
    run(routes::app(app_state)).await
}
