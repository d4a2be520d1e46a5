use std::sync::Arc;

use aws_lambda_events::event::dynamodb::Event;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use room_notifier::RoomNotifier;
use shared::config::Config;
use shared::repositories::player_stats_repository::DynamoDbPlayerStatsRepository;
use shared::repositories::subscription_repository::DynamoDbRoomSubscriptionRepository;
use shared::services::stats_service::StatsService;
use shared::services::subscription_service::RoomSubscriptionService;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    info!("Room notifier Lambda function starting");

    let config = Config::from_env()?;
    let aws_config = aws_config::load_from_env().await;

    let subscription_repository = Arc::new(DynamoDbRoomSubscriptionRepository::new(
        &aws_config,
        &config.room_subscriptions_table,
        config.websocket_endpoint()?,
    ));
    let stats_repository = Arc::new(DynamoDbPlayerStatsRepository::new(
        aws_sdk_dynamodb::Client::new(&aws_config),
        &config.player_stats_table,
    ));

    let notifier = Arc::new(RoomNotifier::new(
        RoomSubscriptionService::new(subscription_repository),
        StatsService::new(stats_repository),
    ));

    run(service_fn(move |event: LambdaEvent<Event>| {
        let notifier = notifier.clone();
        async move {
            let (event, _context) = event.into_parts();
            notifier.handle_event(event).await;
            Ok::<(), Error>(())
        }
    }))
    .await
}
