use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    models::{
        game_room::{GameRoom, RoomStatus},
        player_stats::PlayerStats,
        room_change::RoomChange,
    },
    repositories::player_stats_repository::PlayerStatsRepository,
    services::errors::stats_service_errors::StatsServiceError,
};

/// Per-user counters, fed by completed rooms.
///
/// Updates are not deduplicated: delivering the same completed change twice
/// counts the game twice.
#[derive(Clone)]
pub struct StatsService {
    repository: Arc<dyn PlayerStatsRepository + Send + Sync>,
}

impl StatsService {
    pub fn new(repository: Arc<dyn PlayerStatsRepository + Send + Sync>) -> Self {
        StatsService { repository }
    }

    /// Counts a finished room for one of its participants.
    pub async fn record_completion(
        &self,
        room: &GameRoom,
        participant_id: &str,
    ) -> Result<PlayerStats, StatsServiceError> {
        if room.status != RoomStatus::Completed {
            return Err(StatsServiceError::ValidationError(format!(
                "room {} is {}, not completed",
                room.room_id, room.status
            )));
        }
        if !room.is_participant(participant_id) {
            return Err(StatsServiceError::ValidationError(format!(
                "{} did not play in room {}",
                participant_id, room.room_id
            )));
        }

        let won = room.winner_id.as_deref() == Some(participant_id);
        let stats = self.repository.record_game(participant_id, won).await?;

        info!(
            "Recorded room {} for {} (won: {}), totals {}/{}",
            room.room_id, participant_id, won, stats.games_won, stats.games_played
        );
        Ok(stats)
    }

    /// Records the game for `participant_id` if `change` is the move into completed.
    pub async fn on_room_change(
        &self,
        change: &RoomChange,
        participant_id: &str,
    ) -> Result<Option<PlayerStats>, StatsServiceError> {
        if !change.completed_transition() {
            return Ok(None);
        }
        self.record_completion(&change.room, participant_id)
            .await
            .map(Some)
    }

    /// Records a completed transition for both seats. Used where no client
    /// session is around to do it, e.g. behind the table stream.
    pub async fn record_for_participants(
        &self,
        change: &RoomChange,
    ) -> Result<Vec<PlayerStats>, StatsServiceError> {
        if !change.completed_transition() {
            return Ok(Vec::new());
        }

        let room = &change.room;
        let Some(player2_id) = room.player2_id.as_deref() else {
            warn!("Completed room {} has no second player", room.room_id);
            return Ok(Vec::new());
        };

        let mut recorded = Vec::with_capacity(2);
        for participant_id in [room.player1_id.as_str(), player2_id] {
            recorded.push(self.record_completion(room, participant_id).await?);
        }
        Ok(recorded)
    }

    /// Zeroed stats for users who have not finished a game yet.
    pub async fn get_stats(&self, user_id: &str) -> Result<PlayerStats, StatsServiceError> {
        if user_id.trim().is_empty() {
            return Err(StatsServiceError::ValidationError(
                "user id cannot be empty".to_string(),
            ));
        }

        let stats = self.repository.get_stats(user_id).await?;
        Ok(stats.unwrap_or_else(|| PlayerStats::new(user_id)))
    }
}
