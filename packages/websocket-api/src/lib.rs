pub mod messages;

use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::models::subscription::SubscriptionTopic;
use shared::services::subscription_service::RoomSubscriptionService;
use tracing::{debug, error, info, warn};

use messages::{ClientMessage, ServerMessage};

#[derive(Debug, Deserialize)]
pub struct WebSocketEvent {
    #[serde(rename = "requestContext")]
    pub request_context: RequestContext,
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RequestContext {
    #[serde(rename = "connectionId")]
    pub connection_id: String,
    #[serde(rename = "routeKey")]
    pub route_key: String,
    #[serde(rename = "eventType", default)]
    pub event_type: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct WebSocketResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: Option<String>,
}

impl WebSocketResponse {
    fn ok() -> Self {
        WebSocketResponse {
            status_code: 200,
            body: None,
        }
    }

    fn error(status_code: u16, message: &str) -> Self {
        WebSocketResponse {
            status_code,
            body: Some(json!({ "error": message }).to_string()),
        }
    }
}

/// Routes websocket lifecycle events and client frames to room subscriptions.
#[derive(Clone)]
pub struct WebSocketHandler {
    subscriptions: RoomSubscriptionService,
}

impl WebSocketHandler {
    pub fn new(subscriptions: RoomSubscriptionService) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(&self, event: WebSocketEvent) -> WebSocketResponse {
        let route_key = event.request_context.route_key.as_str();
        let connection_id = event.request_context.connection_id.as_str();
        debug!(
            "Processing route_key: {}, connection_id: {}",
            route_key, connection_id
        );

        match route_key {
            "$connect" => {
                info!("WebSocket connection established: {}", connection_id);
                WebSocketResponse::ok()
            }
            "$disconnect" => self.handle_disconnect(connection_id).await,
            "$default" => {
                self.handle_default_message(connection_id, event.body.as_deref())
                    .await
            }
            _ => {
                error!("Unknown route key: {}", route_key);
                WebSocketResponse::error(400, "Unknown route")
            }
        }
    }

    async fn handle_disconnect(&self, connection_id: &str) -> WebSocketResponse {
        info!("WebSocket connection disconnected: {}", connection_id);

        // The connection is already closed, nothing useful to report back.
        match self.subscriptions.remove_connection(connection_id).await {
            Ok(removed) => debug!("Dropped {} subscriptions of {}", removed, connection_id),
            Err(e) => error!("Failed to remove connection {}: {}", connection_id, e),
        }
        WebSocketResponse::ok()
    }

    async fn handle_default_message(
        &self,
        connection_id: &str,
        body: Option<&str>,
    ) -> WebSocketResponse {
        let Some(body) = body else {
            return self
                .reply(connection_id, ServerMessage::error("No message body"))
                .await;
        };

        let message: ClientMessage = match serde_json::from_str(body) {
            Ok(message) => message,
            Err(e) => {
                warn!("Unreadable frame from {}: {}", connection_id, e);
                return self
                    .reply(connection_id, ServerMessage::error("Unknown or malformed action"))
                    .await;
            }
        };

        let reply = match message {
            ClientMessage::Ping => ServerMessage::pong(),
            ClientMessage::Subscribe { topic } => match SubscriptionTopic::parse(&topic) {
                Some(parsed) => match self.subscriptions.subscribe(connection_id, &parsed).await {
                    Ok(()) => ServerMessage::Subscribed { topic },
                    Err(e) => {
                        error!("Failed to subscribe {} to {}: {}", connection_id, topic, e);
                        return WebSocketResponse::error(500, "Failed to subscribe");
                    }
                },
                None => ServerMessage::error(format!("Unknown topic: {}", topic)),
            },
            ClientMessage::Unsubscribe { topic } => match SubscriptionTopic::parse(&topic) {
                Some(parsed) => match self.subscriptions.unsubscribe(connection_id, &parsed).await
                {
                    Ok(()) => ServerMessage::Unsubscribed { topic },
                    Err(e) => {
                        error!(
                            "Failed to unsubscribe {} from {}: {}",
                            connection_id, topic, e
                        );
                        return WebSocketResponse::error(500, "Failed to unsubscribe");
                    }
                },
                None => ServerMessage::error(format!("Unknown topic: {}", topic)),
            },
        };

        self.reply(connection_id, reply).await
    }

    async fn reply(&self, connection_id: &str, message: ServerMessage) -> WebSocketResponse {
        let payload = match serde_json::to_string(&message) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to encode reply: {}", e);
                return WebSocketResponse::error(500, "Failed to send response");
            }
        };

        if let Err(e) = self.subscriptions.send_message(connection_id, &payload).await {
            error!("Failed to reply to {}: {}", connection_id, e);
            return WebSocketResponse::error(500, "Failed to send response");
        }
        WebSocketResponse::ok()
    }
}
