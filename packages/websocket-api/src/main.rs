use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use std::sync::Arc;
use tracing::debug;

use shared::config::Config;
use shared::repositories::subscription_repository::DynamoDbRoomSubscriptionRepository;
use shared::services::subscription_service::RoomSubscriptionService;
use websocket_api::{WebSocketEvent, WebSocketHandler, WebSocketResponse};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let config = Config::from_env()?;
    let aws_config = aws_config::load_from_env().await;

    let subscription_repository = Arc::new(DynamoDbRoomSubscriptionRepository::new(
        &aws_config,
        &config.room_subscriptions_table,
        config.websocket_endpoint()?,
    ));
    let handler = WebSocketHandler::new(RoomSubscriptionService::new(subscription_repository));

    run(service_fn(|event: LambdaEvent<WebSocketEvent>| {
        let handler = handler.clone();
        async move {
            debug!("Received WebSocket event: {:?}", event.payload);
            Ok::<WebSocketResponse, Error>(handler.handle(event.payload).await)
        }
    }))
    .await
}
