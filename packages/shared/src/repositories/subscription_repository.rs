use async_trait::async_trait;
use aws_sdk_apigatewaymanagement::{primitives::Blob, Client as ApiGatewayClient};
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use serde_dynamo::aws_sdk_dynamodb_1::to_item;
use tracing::info;

#[cfg(test)]
use mockall::automock;

use crate::models::subscription::TopicSubscription;
use crate::repositories::errors::subscription_repository_errors::SubscriptionRepositoryError;

pub const CONNECTION_ID_INDEX: &str = "ConnectionIdIndex";

/// Websocket subscriptions to room topics, and delivery to those connections.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RoomSubscriptionRepository: Send + Sync {
    async fn add_subscription(
        &self,
        subscription: &TopicSubscription,
    ) -> Result<(), SubscriptionRepositoryError>;

    async fn remove_subscription(
        &self,
        topic: &str,
        connection_id: &str,
    ) -> Result<(), SubscriptionRepositoryError>;

    /// Drops every subscription held by a connection, returning how many were removed.
    async fn remove_connection(&self, connection_id: &str)
        -> Result<usize, SubscriptionRepositoryError>;

    async fn connections_for_topic(
        &self,
        topic: &str,
    ) -> Result<Vec<String>, SubscriptionRepositoryError>;

    async fn send_message(
        &self,
        connection_id: &str,
        message: &str,
    ) -> Result<(), SubscriptionRepositoryError>;
}

pub struct DynamoDbRoomSubscriptionRepository {
    dynamodb_client: DynamoDbClient,
    api_gateway_client: ApiGatewayClient,
    table_name: String,
}

impl DynamoDbRoomSubscriptionRepository {
    /// `websocket_endpoint` is the management endpoint of the websocket API stage.
    pub fn new(
        sdk_config: &aws_config::SdkConfig,
        table_name: &str,
        websocket_endpoint: &str,
    ) -> Self {
        let api_gateway_config = aws_sdk_apigatewaymanagement::config::Builder::from(sdk_config)
            .endpoint_url(websocket_endpoint)
            .build();

        Self {
            dynamodb_client: DynamoDbClient::new(sdk_config),
            api_gateway_client: ApiGatewayClient::from_conf(api_gateway_config),
            table_name: table_name.to_string(),
        }
    }

    async fn query_connection_ids(
        &self,
        index_name: Option<&str>,
        key_name: &str,
        key_value: &str,
    ) -> Result<Vec<(String, String)>, SubscriptionRepositoryError> {
        let mut pairs = Vec::new();
        let mut start_key = None;

        loop {
            let output = self
                .dynamodb_client
                .query()
                .table_name(&self.table_name)
                .set_index_name(index_name.map(str::to_string))
                .key_condition_expression("#key = :value")
                .expression_attribute_names("#key", key_name)
                .expression_attribute_values(":value", AttributeValue::S(key_value.to_string()))
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(|e| SubscriptionRepositoryError::DynamoDb(e.to_string()))?;

            for item in output.items.unwrap_or_default() {
                let topic = item.get("topic").and_then(|value| value.as_s().ok());
                let connection_id = item.get("connection_id").and_then(|value| value.as_s().ok());
                if let (Some(topic), Some(connection_id)) = (topic, connection_id) {
                    pairs.push((topic.clone(), connection_id.clone()));
                }
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(pairs)
    }
}

#[async_trait]
impl RoomSubscriptionRepository for DynamoDbRoomSubscriptionRepository {
    async fn add_subscription(
        &self,
        subscription: &TopicSubscription,
    ) -> Result<(), SubscriptionRepositoryError> {
        let item = to_item(subscription)
            .map_err(|e| SubscriptionRepositoryError::Serialization(e.to_string()))?;

        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| SubscriptionRepositoryError::DynamoDb(e.to_string()))?;

        info!(
            "Subscribed connection {} to {}",
            subscription.connection_id, subscription.topic
        );
        Ok(())
    }

    async fn remove_subscription(
        &self,
        topic: &str,
        connection_id: &str,
    ) -> Result<(), SubscriptionRepositoryError> {
        self.dynamodb_client
            .delete_item()
            .table_name(&self.table_name)
            .key("topic", AttributeValue::S(topic.to_string()))
            .key("connection_id", AttributeValue::S(connection_id.to_string()))
            .send()
            .await
            .map_err(|e| SubscriptionRepositoryError::DynamoDb(e.to_string()))?;

        info!("Unsubscribed connection {} from {}", connection_id, topic);
        Ok(())
    }

    async fn remove_connection(
        &self,
        connection_id: &str,
    ) -> Result<usize, SubscriptionRepositoryError> {
        let subscriptions = self
            .query_connection_ids(Some(CONNECTION_ID_INDEX), "connection_id", connection_id)
            .await?;

        for (topic, connection_id) in &subscriptions {
            self.remove_subscription(topic, connection_id).await?;
        }

        Ok(subscriptions.len())
    }

    async fn connections_for_topic(
        &self,
        topic: &str,
    ) -> Result<Vec<String>, SubscriptionRepositoryError> {
        let subscriptions = self.query_connection_ids(None, "topic", topic).await?;
        Ok(subscriptions
            .into_iter()
            .map(|(_, connection_id)| connection_id)
            .collect())
    }

    async fn send_message(
        &self,
        connection_id: &str,
        message: &str,
    ) -> Result<(), SubscriptionRepositoryError> {
        let result = self
            .api_gateway_client
            .post_to_connection()
            .connection_id(connection_id)
            .data(Blob::new(message.as_bytes()))
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                if e.as_service_error().is_some_and(|err| err.is_gone_exception()) {
                    return Err(SubscriptionRepositoryError::ConnectionGone(
                        connection_id.to_string(),
                    ));
                }
                Err(SubscriptionRepositoryError::ApiGateway(e.to_string()))
            }
        }
    }
}
