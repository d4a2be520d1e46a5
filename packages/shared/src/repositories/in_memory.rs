//! Process-local stores. Writes to rooms are published on a [`RoomChangeHub`],
//! which makes them a self-contained stand-in for the table plus its stream.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::feed::RoomChangeHub;
use crate::models::game_room::{GameRoom, RoomStatus};
use crate::models::player_stats::PlayerStats;
use crate::models::room_change::RoomChange;
use crate::models::subscription::TopicSubscription;
use crate::repositories::errors::game_room_repository_errors::GameRoomRepositoryError;
use crate::repositories::errors::player_stats_repository_errors::PlayerStatsRepositoryError;
use crate::repositories::errors::subscription_repository_errors::SubscriptionRepositoryError;
use crate::repositories::game_room_repository::GameRoomRepository;
use crate::repositories::player_stats_repository::PlayerStatsRepository;
use crate::repositories::subscription_repository::RoomSubscriptionRepository;

pub struct InMemoryGameRoomRepository {
    rooms: Arc<RwLock<HashMap<String, GameRoom>>>,
    hub: RoomChangeHub,
}

impl Default for InMemoryGameRoomRepository {
    fn default() -> Self {
        Self::new(RoomChangeHub::default())
    }
}

impl InMemoryGameRoomRepository {
    pub fn new(hub: RoomChangeHub) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            hub,
        }
    }

    /// Hub that receives a change for every write to this store.
    pub fn hub(&self) -> &RoomChangeHub {
        &self.hub
    }
}

#[async_trait]
impl GameRoomRepository for InMemoryGameRoomRepository {
    async fn create_room(&self, room: &GameRoom) -> Result<(), GameRoomRepositoryError> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(&room.room_id) {
            return Err(GameRoomRepositoryError::DynamoDb(format!(
                "room {} already exists",
                room.room_id
            )));
        }
        rooms.insert(room.room_id.clone(), room.clone());
        // Published under the lock so subscribers see changes in write order.
        self.hub.publish(RoomChange::inserted(room.clone()));
        Ok(())
    }

    async fn get_room(&self, room_id: &str) -> Result<Option<GameRoom>, GameRoomRepositoryError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.get(room_id).cloned())
    }

    async fn list_open_rooms(
        &self,
        limit: usize,
    ) -> Result<Vec<GameRoom>, GameRoomRepositoryError> {
        let rooms = self.rooms.read().await;
        let mut open: Vec<GameRoom> = rooms.values().filter(|room| room.is_open()).cloned().collect();
        open.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        open.truncate(limit);
        Ok(open)
    }

    async fn claim_seat(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> Result<Option<GameRoom>, GameRoomRepositoryError> {
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(room_id) else {
            return Ok(None);
        };
        if !room.is_open() {
            return Ok(None);
        }

        let previous = room.clone();
        room.player2_id = Some(player_id.to_string());
        room.status = RoomStatus::InProgress;
        room.version += 1;

        let claimed = room.clone();
        self.hub
            .publish(RoomChange::updated(Some(previous), claimed.clone()));
        Ok(Some(claimed))
    }

    async fn replace_room(
        &self,
        room: &GameRoom,
        expected_version: u64,
    ) -> Result<bool, GameRoomRepositoryError> {
        let mut rooms = self.rooms.write().await;
        let Some(stored) = rooms.get_mut(&room.room_id) else {
            return Ok(false);
        };
        if stored.version != expected_version {
            return Ok(false);
        }

        let previous = std::mem::replace(stored, room.clone());
        self.hub
            .publish(RoomChange::updated(Some(previous), room.clone()));
        Ok(true)
    }

    async fn cancel_room(
        &self,
        room_id: &str,
        cancelled_at: DateTime<Utc>,
    ) -> Result<Option<GameRoom>, GameRoomRepositoryError> {
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(room_id) else {
            return Ok(None);
        };
        if room.status.is_terminal() {
            return Ok(None);
        }

        let previous = room.clone();
        room.status = RoomStatus::Cancelled;
        room.completed_at = Some(cancelled_at);
        room.version += 1;

        let cancelled = room.clone();
        self.hub
            .publish(RoomChange::updated(Some(previous), cancelled.clone()));
        Ok(Some(cancelled))
    }
}

#[derive(Default)]
pub struct InMemoryPlayerStatsRepository {
    stats: Mutex<HashMap<String, PlayerStats>>,
}

impl InMemoryPlayerStatsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlayerStatsRepository for InMemoryPlayerStatsRepository {
    async fn record_game(
        &self,
        user_id: &str,
        won: bool,
    ) -> Result<PlayerStats, PlayerStatsRepositoryError> {
        let mut stats = self.stats.lock().await;
        let entry = stats
            .entry(user_id.to_string())
            .or_insert_with(|| PlayerStats::new(user_id));
        entry.games_played += 1;
        if won {
            entry.games_won += 1;
        }
        Ok(entry.clone())
    }

    async fn get_stats(
        &self,
        user_id: &str,
    ) -> Result<Option<PlayerStats>, PlayerStatsRepositoryError> {
        let stats = self.stats.lock().await;
        Ok(stats.get(user_id).cloned())
    }
}

#[derive(Default)]
struct SubscriptionTable {
    topics: HashMap<String, BTreeSet<String>>,
    gone: HashSet<String>,
    sent: Vec<(String, String)>,
}

/// Topic subscriptions plus an outbox standing in for the websocket gateway.
#[derive(Default)]
pub struct InMemoryRoomSubscriptionRepository {
    table: Mutex<SubscriptionTable>,
}

impl InMemoryRoomSubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later delivery to `connection_id` fail as gone.
    pub async fn disconnect(&self, connection_id: &str) {
        let mut table = self.table.lock().await;
        table.gone.insert(connection_id.to_string());
    }

    /// Messages delivered so far, as (connection id, payload).
    pub async fn sent(&self) -> Vec<(String, String)> {
        self.table.lock().await.sent.clone()
    }
}

#[async_trait]
impl RoomSubscriptionRepository for InMemoryRoomSubscriptionRepository {
    async fn add_subscription(
        &self,
        subscription: &TopicSubscription,
    ) -> Result<(), SubscriptionRepositoryError> {
        let mut table = self.table.lock().await;
        table
            .topics
            .entry(subscription.topic.clone())
            .or_default()
            .insert(subscription.connection_id.clone());
        Ok(())
    }

    async fn remove_subscription(
        &self,
        topic: &str,
        connection_id: &str,
    ) -> Result<(), SubscriptionRepositoryError> {
        let mut table = self.table.lock().await;
        if let Some(connections) = table.topics.get_mut(topic) {
            connections.remove(connection_id);
        }
        Ok(())
    }

    async fn remove_connection(
        &self,
        connection_id: &str,
    ) -> Result<usize, SubscriptionRepositoryError> {
        let mut table = self.table.lock().await;
        let removed = table
            .topics
            .values_mut()
            .map(|connections| connections.remove(connection_id))
            .filter(|removed| *removed)
            .count();
        Ok(removed)
    }

    async fn connections_for_topic(
        &self,
        topic: &str,
    ) -> Result<Vec<String>, SubscriptionRepositoryError> {
        let table = self.table.lock().await;
        Ok(table
            .topics
            .get(topic)
            .map(|connections| connections.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn send_message(
        &self,
        connection_id: &str,
        message: &str,
    ) -> Result<(), SubscriptionRepositoryError> {
        let mut table = self.table.lock().await;
        if table.gone.contains(connection_id) {
            return Err(SubscriptionRepositoryError::ConnectionGone(
                connection_id.to_string(),
            ));
        }
        table
            .sent
            .push((connection_id.to_string(), message.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{RoomChangeFeed, RoomFilter};
    use crate::models::game_state::GameType;
    use crate::models::room_change::RoomChangeKind;

    #[tokio::test]
    async fn test_writes_are_published() {
        let repository = InMemoryGameRoomRepository::default();
        let room = GameRoom::new(GameType::TicTacToe, "alice");
        let mut subscription = repository
            .hub()
            .subscribe(RoomFilter::Room(room.room_id.clone()));

        repository.create_room(&room).await.unwrap();
        repository.claim_seat(&room.room_id, "bob").await.unwrap();

        let inserted = subscription.recv().await.unwrap();
        assert_eq!(inserted.kind, RoomChangeKind::Inserted);

        let joined = subscription.recv().await.unwrap();
        assert_eq!(joined.kind, RoomChangeKind::Updated);
        assert_eq!(joined.room.player2_id.as_deref(), Some("bob"));
        assert_eq!(joined.previous.unwrap().status, RoomStatus::Waiting);
    }

    #[tokio::test]
    async fn test_seat_can_only_be_claimed_once() {
        let repository = InMemoryGameRoomRepository::default();
        let room = GameRoom::new(GameType::TicTacToe, "alice");
        repository.create_room(&room).await.unwrap();

        let first = repository.claim_seat(&room.room_id, "bob").await.unwrap();
        let second = repository.claim_seat(&room.room_id, "carol").await.unwrap();

        assert_eq!(first.unwrap().version, 1);
        assert!(second.is_none());
        let stored = repository.get_room(&room.room_id).await.unwrap().unwrap();
        assert_eq!(stored.player2_id.as_deref(), Some("bob"));
    }

    #[tokio::test]
    async fn test_replace_requires_expected_version() {
        let repository = InMemoryGameRoomRepository::default();
        let room = GameRoom::new(GameType::TicTacToe, "alice");
        repository.create_room(&room).await.unwrap();

        let mut next = room.clone();
        next.version = 1;

        assert!(!repository.replace_room(&next, 5).await.unwrap());
        assert!(repository.replace_room(&next, 0).await.unwrap());
        assert!(!repository.replace_room(&next, 0).await.unwrap());
    }

    #[tokio::test]
    async fn test_open_rooms_newest_first_and_limited() {
        let repository = InMemoryGameRoomRepository::default();
        let mut ids = Vec::new();
        for offset in 0..4 {
            let mut room = GameRoom::new(GameType::RockPaperScissors, "alice");
            room.created_at = Utc::now() + chrono::Duration::seconds(offset);
            ids.push(room.room_id.clone());
            repository.create_room(&room).await.unwrap();
        }
        repository.claim_seat(&ids[3], "bob").await.unwrap();

        let open = repository.list_open_rooms(2).await.unwrap();

        let open_ids: Vec<&str> = open.iter().map(|room| room.room_id.as_str()).collect();
        assert_eq!(open_ids, vec![ids[2].as_str(), ids[1].as_str()]);
    }

    #[tokio::test]
    async fn test_cancel_only_unfinished_rooms() {
        let repository = InMemoryGameRoomRepository::default();
        let room = GameRoom::new(GameType::TicTacToe, "alice");
        repository.create_room(&room).await.unwrap();

        let cancelled = repository
            .cancel_room(&room.room_id, Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cancelled.status, RoomStatus::Cancelled);
        assert!(cancelled.completed_at.is_some());

        assert!(repository
            .cancel_room(&room.room_id, Utc::now())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_stats_accumulate() {
        let repository = InMemoryPlayerStatsRepository::new();

        repository.record_game("alice", true).await.unwrap();
        let stats = repository.record_game("alice", false).await.unwrap();

        assert_eq!(stats.games_played, 2);
        assert_eq!(stats.games_won, 1);
        assert!(repository.get_stats("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_connection_clears_every_topic() {
        use crate::models::subscription::SubscriptionTopic;

        let repository = InMemoryRoomSubscriptionRepository::new();
        for topic in [
            SubscriptionTopic::OpenRooms,
            SubscriptionTopic::Room("abc".to_string()),
        ] {
            repository
                .add_subscription(&TopicSubscription::new(&topic, "conn-1"))
                .await
                .unwrap();
        }

        assert_eq!(repository.remove_connection("conn-1").await.unwrap(), 2);
        assert!(repository
            .connections_for_topic("open_rooms")
            .await
            .unwrap()
            .is_empty());
    }
}
