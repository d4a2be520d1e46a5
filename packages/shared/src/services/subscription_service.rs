use std::sync::Arc;
use tracing::{info, warn};

use crate::models::room_change::RoomChange;
use crate::models::subscription::{RoomChangeMessage, SubscriptionTopic, TopicSubscription};
use crate::repositories::errors::subscription_repository_errors::SubscriptionRepositoryError;
use crate::repositories::subscription_repository::RoomSubscriptionRepository;
use crate::services::errors::subscription_service_errors::SubscriptionServiceError;

/// Counts from one fan-out of a change.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishSummary {
    pub delivered: usize,
    pub pruned: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct RoomSubscriptionService {
    repository: Arc<dyn RoomSubscriptionRepository + Send + Sync>,
}

impl RoomSubscriptionService {
    pub fn new(repository: Arc<dyn RoomSubscriptionRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    pub async fn subscribe(
        &self,
        connection_id: &str,
        topic: &SubscriptionTopic,
    ) -> Result<(), SubscriptionServiceError> {
        info!("Subscribing connection {} to {}", connection_id, topic.key());
        let subscription = TopicSubscription::new(topic, connection_id);
        self.repository.add_subscription(&subscription).await?;
        Ok(())
    }

    pub async fn unsubscribe(
        &self,
        connection_id: &str,
        topic: &SubscriptionTopic,
    ) -> Result<(), SubscriptionServiceError> {
        self.repository
            .remove_subscription(&topic.key(), connection_id)
            .await?;
        Ok(())
    }

    pub async fn remove_connection(
        &self,
        connection_id: &str,
    ) -> Result<usize, SubscriptionServiceError> {
        info!("Removing subscriptions of connection: {}", connection_id);
        Ok(self.repository.remove_connection(connection_id).await?)
    }

    pub async fn send_message(
        &self,
        connection_id: &str,
        message: &str,
    ) -> Result<(), SubscriptionServiceError> {
        self.repository.send_message(connection_id, message).await?;
        Ok(())
    }

    /// Pushes `change` to every connection listening on its topics.
    ///
    /// A connection that is gone loses all its subscriptions; any other
    /// delivery failure is logged and counted, the rest still get the change.
    pub async fn publish_change(
        &self,
        change: &RoomChange,
    ) -> Result<PublishSummary, SubscriptionServiceError> {
        let mut summary = PublishSummary::default();

        for topic in SubscriptionTopic::for_change(change) {
            let message = serde_json::to_string(&RoomChangeMessage::new(&topic, change))?;
            let connections = self.repository.connections_for_topic(&topic.key()).await?;

            for connection_id in connections {
                match self.repository.send_message(&connection_id, &message).await {
                    Ok(()) => summary.delivered += 1,
                    Err(SubscriptionRepositoryError::ConnectionGone(_)) => {
                        info!("Connection {} is gone, pruning it", connection_id);
                        self.repository.remove_connection(&connection_id).await?;
                        summary.pruned += 1;
                    }
                    Err(e) => {
                        warn!(
                            "Failed to deliver room {} to {}: {}",
                            change.room_id(),
                            connection_id,
                            e
                        );
                        summary.failed += 1;
                    }
                }
            }
        }

        Ok(summary)
    }
}
