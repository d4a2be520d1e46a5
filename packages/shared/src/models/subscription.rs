use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::room_change::RoomChange;

const OPEN_ROOMS_TOPIC: &str = "open_rooms";
const ROOM_TOPIC_PREFIX: &str = "room#";

/// What a websocket connection is listening to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubscriptionTopic {
    Room(String),
    OpenRooms,
}

impl SubscriptionTopic {
    /// Partition key used in the subscriptions table, e.g. "room#<id>" or "open_rooms".
    pub fn key(&self) -> String {
        match self {
            SubscriptionTopic::Room(room_id) => format!("{}{}", ROOM_TOPIC_PREFIX, room_id),
            SubscriptionTopic::OpenRooms => OPEN_ROOMS_TOPIC.to_string(),
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        if key == OPEN_ROOMS_TOPIC {
            return Some(SubscriptionTopic::OpenRooms);
        }
        key.strip_prefix(ROOM_TOPIC_PREFIX)
            .filter(|room_id| !room_id.is_empty())
            .map(|room_id| SubscriptionTopic::Room(room_id.to_string()))
    }

    /// Topics whose subscribers must hear about `change`.
    pub fn for_change(change: &RoomChange) -> Vec<SubscriptionTopic> {
        let mut topics = vec![SubscriptionTopic::Room(change.room_id().to_string())];
        if change.affects_open_rooms() {
            topics.push(SubscriptionTopic::OpenRooms);
        }
        topics
    }
}

/// A connection subscribed to a topic.
/// Partition key: `topic`, sort key: `connection_id`; `ConnectionIdIndex` maps back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSubscription {
    pub topic: String,
    pub connection_id: String,
    pub subscribed_at: DateTime<Utc>,
}

impl TopicSubscription {
    pub fn new(topic: &SubscriptionTopic, connection_id: &str) -> Self {
        TopicSubscription {
            topic: topic.key(),
            connection_id: connection_id.to_string(),
            subscribed_at: Utc::now(),
        }
    }
}

/// Message pushed to websocket subscribers for every room change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomChangeMessage {
    pub action: String,
    pub topic: String,
    pub change: RoomChange,
}

impl RoomChangeMessage {
    pub fn new(topic: &SubscriptionTopic, change: &RoomChange) -> Self {
        RoomChangeMessage {
            action: "room_changed".to_string(),
            topic: topic.key(),
            change: change.clone(),
        }
    }
}
