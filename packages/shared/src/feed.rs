//! In-process change notification channel for game rooms.
//!
//! Every write to a room produces a [`RoomChange`]; subscribers pick the rows
//! they care about with a [`RoomFilter`] and wait on [`RoomSubscription::recv`].

use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::models::room_change::RoomChange;

pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// Row filter applied on the subscriber side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomFilter {
    All,
    Room(String),
    /// Changes that add a room to, or remove one from, the open-room list.
    OpenRooms,
}

impl RoomFilter {
    pub fn matches(&self, change: &RoomChange) -> bool {
        match self {
            RoomFilter::All => true,
            RoomFilter::Room(room_id) => change.room_id() == room_id,
            RoomFilter::OpenRooms => change.affects_open_rooms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The subscriber fell behind and `0` changes were dropped for it.
    #[error("subscriber lagged, {0} changes dropped")]
    Lagged(u64),
    #[error("room change feed closed")]
    Closed,
}

pub trait RoomChangeFeed: Send + Sync {
    fn subscribe(&self, filter: RoomFilter) -> RoomSubscription;
}

/// Fan-out hub backed by a Tokio broadcast channel.
#[derive(Clone)]
pub struct RoomChangeHub {
    sender: broadcast::Sender<RoomChange>,
}

impl Default for RoomChangeHub {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl RoomChangeHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Deliver a change to all current subscribers. Nobody listening is not an error.
    pub fn publish(&self, change: RoomChange) {
        let _ = self.sender.send(change);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl RoomChangeFeed for RoomChangeHub {
    fn subscribe(&self, filter: RoomFilter) -> RoomSubscription {
        RoomSubscription {
            filter,
            receiver: self.sender.subscribe(),
        }
    }
}

/// A live subscription. Dropping it unsubscribes.
pub struct RoomSubscription {
    filter: RoomFilter,
    receiver: broadcast::Receiver<RoomChange>,
}

impl RoomSubscription {
    pub fn filter(&self) -> &RoomFilter {
        &self.filter
    }

    /// Waits for the next matching change.
    ///
    /// `Lagged` means changes were dropped, possibly including the last one a
    /// room will ever get; the caller has to re-read the rows it follows. The
    /// subscription stays usable and continues with the oldest retained change.
    pub async fn recv(&mut self) -> Result<RoomChange, FeedError> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if self.filter.matches(&change) => return Ok(change),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => return Err(FeedError::Lagged(skipped)),
                Err(RecvError::Closed) => return Err(FeedError::Closed),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::game_room::GameRoom;
    use crate::models::game_state::GameType;

    #[tokio::test]
    async fn test_room_filter_only_sees_its_room() {
        let hub = RoomChangeHub::default();
        let watched = GameRoom::new(GameType::TicTacToe, "alice");
        let other = GameRoom::new(GameType::TicTacToe, "carol");
        let mut subscription = hub.subscribe(RoomFilter::Room(watched.room_id.clone()));

        hub.publish(RoomChange::inserted(other));
        hub.publish(RoomChange::inserted(watched.clone()));

        let change = subscription.recv().await.unwrap();
        assert_eq!(change.room_id(), watched.room_id);
    }

    #[tokio::test]
    async fn test_every_subscriber_gets_the_change() {
        let hub = RoomChangeHub::default();
        let mut first = hub.subscribe(RoomFilter::All);
        let mut second = hub.subscribe(RoomFilter::OpenRooms);
        assert_eq!(hub.subscriber_count(), 2);

        let room = GameRoom::new(GameType::RockPaperScissors, "alice");
        hub.publish(RoomChange::inserted(room.clone()));

        assert_eq!(first.recv().await.unwrap().room, room);
        assert_eq!(second.recv().await.unwrap().room, room);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_is_told_and_resumes() {
        let hub = RoomChangeHub::new(2);
        let mut subscription = hub.subscribe(RoomFilter::All);

        let mut room = GameRoom::new(GameType::TicTacToe, "alice");
        for version in 0..5 {
            room.version = version;
            hub.publish(RoomChange::inserted(room.clone()));
        }

        assert_eq!(subscription.recv().await, Err(FeedError::Lagged(3)));
        let change = subscription.recv().await.unwrap();
        assert_eq!(change.room.version, 3);
    }

    #[tokio::test]
    async fn test_closed_hub_ends_subscription() {
        let hub = RoomChangeHub::default();
        let mut subscription = hub.subscribe(RoomFilter::All);

        drop(hub);

        assert_eq!(subscription.recv().await, Err(FeedError::Closed));
    }
}
