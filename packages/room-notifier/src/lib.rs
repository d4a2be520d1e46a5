//! Stream consumer for the game rooms table.
//!
//! Every inserted or modified room is pushed to the websocket connections
//! subscribed to it (and to the open-room list when relevant). The change
//! that completes a room also updates both participants' stats.

use aws_lambda_events::event::dynamodb::{Event, EventRecord};
use serde_dynamo::{from_item, Item};
use shared::models::game_room::GameRoom;
use shared::models::room_change::RoomChange;
use shared::services::errors::stats_service_errors::StatsServiceError;
use shared::services::errors::subscription_service_errors::SubscriptionServiceError;
use shared::services::stats_service::StatsService;
use shared::services::subscription_service::{PublishSummary, RoomSubscriptionService};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Could not decode room image: {0}")]
    Decode(String),
    #[error(transparent)]
    Subscription(#[from] SubscriptionServiceError),
    #[error(transparent)]
    Stats(#[from] StatsServiceError),
}

/// Turns one stream record into a change. Removals are not room changes.
pub fn decode_change(
    event_name: &str,
    new_image: Item,
    old_image: Item,
) -> Result<Option<RoomChange>, NotifierError> {
    match event_name {
        "INSERT" => Ok(Some(RoomChange::inserted(decode_room(new_image)?))),
        "MODIFY" => {
            let room = decode_room(new_image)?;
            let previous = match decode_room(old_image) {
                Ok(previous) => Some(previous),
                Err(e) => {
                    warn!(
                        "Room {} modified without a usable old image: {}",
                        room.room_id, e
                    );
                    None
                }
            };
            Ok(Some(RoomChange::updated(previous, room)))
        }
        _ => Ok(None),
    }
}

fn decode_room(image: Item) -> Result<GameRoom, NotifierError> {
    from_item(image).map_err(|e| NotifierError::Decode(e.to_string()))
}

pub struct RoomNotifier {
    subscriptions: RoomSubscriptionService,
    stats: StatsService,
}

impl RoomNotifier {
    pub fn new(subscriptions: RoomSubscriptionService, stats: StatsService) -> Self {
        Self {
            subscriptions,
            stats,
        }
    }

    /// Processes a batch. A failing record is logged and skipped; returns how many failed.
    pub async fn handle_event(&self, event: Event) -> usize {
        info!("Processing {} records", event.records.len());

        let mut failed = 0;
        for record in event.records {
            if let Err(e) = self.handle_record(record).await {
                error!("Failed to process record: {}", e);
                failed += 1;
            }
        }
        failed
    }

    pub async fn handle_record(&self, record: EventRecord) -> Result<(), NotifierError> {
        self.handle_images(
            &record.event_name,
            record.change.new_image,
            record.change.old_image,
        )
        .await
    }

    pub async fn handle_images(
        &self,
        event_name: &str,
        new_image: Item,
        old_image: Item,
    ) -> Result<(), NotifierError> {
        match decode_change(event_name, new_image, old_image)? {
            Some(change) => {
                self.handle_change(&change).await?;
            }
            None => info!("Unhandled event type: {}", event_name),
        }
        Ok(())
    }

    /// Fans the change out, then counts it if it completed the room. Stats
    /// are still attempted when delivery fails.
    pub async fn handle_change(&self, change: &RoomChange) -> Result<PublishSummary, NotifierError> {
        let published = self.subscriptions.publish_change(change).await;
        let recorded = self.stats.record_for_participants(change).await;

        let summary = published?;
        let stats = recorded?;

        info!(
            "Room {} v{}: delivered {}, pruned {}, failed {}, stats updated for {}",
            change.room_id(),
            change.room.version,
            summary.delivered,
            summary.pruned,
            summary.failed,
            stats.len()
        );
        Ok(summary)
    }
}
