//! Event-driven participant loop.
//!
//! A session follows one room through the change feed, forwards its
//! participant's moves and, once the room completes, records the result for
//! that participant only. The opponent's session records theirs.

use tracing::{debug, info, warn};

use crate::{
    feed::{FeedError, RoomChangeFeed, RoomFilter, RoomSubscription},
    models::{
        game_room::{GameRoom, RoomStatus},
        game_state::PlayerMove,
        player_stats::PlayerStats,
        room_change::RoomChange,
    },
    services::{
        errors::room_session_errors::RoomSessionError,
        game_service::{GameService, MoveOutcome},
        stats_service::StatsService,
    },
};

pub struct RoomSession {
    participant_id: String,
    room: GameRoom,
    subscription: RoomSubscription,
    game_service: GameService,
    stats_service: StatsService,
    finished: bool,
    recorded: Option<PlayerStats>,
}

impl RoomSession {
    /// Starts following `room` as `participant_id`.
    pub fn start(
        feed: &dyn RoomChangeFeed,
        game_service: GameService,
        stats_service: StatsService,
        room: GameRoom,
        participant_id: &str,
    ) -> Result<Self, RoomSessionError> {
        if !room.is_participant(participant_id) {
            return Err(RoomSessionError::NotParticipant(room.room_id));
        }

        let subscription = feed.subscribe(RoomFilter::Room(room.room_id.clone()));
        let finished = room.status.is_terminal();

        Ok(RoomSession {
            participant_id: participant_id.to_string(),
            room,
            subscription,
            game_service,
            stats_service,
            finished,
            recorded: None,
        })
    }

    pub fn room(&self) -> &GameRoom {
        &self.room
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Stats written when this session saw the room complete.
    pub fn recorded(&self) -> Option<&PlayerStats> {
        self.recorded.as_ref()
    }

    pub fn is_my_turn(&self) -> bool {
        if self.finished || self.room.status != RoomStatus::InProgress {
            return false;
        }
        self.room
            .seat_of(&self.participant_id)
            .is_some_and(|seat| self.room.game_state.awaits(seat))
    }

    /// Submits a move. The row the service returns becomes the local view;
    /// completion is still only acted on when the feed delivers it.
    pub async fn play(&mut self, player_move: PlayerMove) -> Result<MoveOutcome, RoomSessionError> {
        let outcome = self
            .game_service
            .submit(&self.room.room_id, &self.participant_id, player_move)
            .await?;

        if let MoveOutcome::Ignored { reason, .. } = &outcome {
            debug!(
                "{} move in room {} ignored: {}",
                self.participant_id, self.room.room_id, reason
            );
        }
        self.observe(outcome.room().clone());
        Ok(outcome)
    }

    /// Folds one change into the session. Returns the participant's new
    /// totals when this change is the completion.
    pub async fn handle_change(
        &mut self,
        change: &RoomChange,
    ) -> Result<Option<PlayerStats>, RoomSessionError> {
        if self.finished || change.room_id() != self.room.room_id {
            return Ok(None);
        }
        if change.room.version < self.room.version {
            debug!(
                "Skipping stale version {} of room {}",
                change.room.version, self.room.room_id
            );
            return Ok(None);
        }

        if !change.room.is_consistent() {
            warn!(
                "Room {} is {} but its board says otherwise",
                change.room_id(),
                change.room.status
            );
        }
        self.room = change.room.clone();

        if change.completed_transition() {
            let stats = self
                .stats_service
                .on_room_change(change, &self.participant_id)
                .await?;
            info!(
                "{} finished room {}, winner: {}",
                self.participant_id,
                self.room.room_id,
                self.room.winner_id.as_deref().unwrap_or("none")
            );
            self.finished = true;
            self.recorded = stats.clone();
            return Ok(stats);
        }

        if self.room.status == RoomStatus::Cancelled {
            info!("Room {} was cancelled", self.room.room_id);
            self.finished = true;
        }
        Ok(None)
    }

    /// Waits for the next change and folds it in. When the feed dropped
    /// changes for this session, the stored row stands in for them.
    pub async fn next_change(&mut self) -> Result<RoomChange, RoomSessionError> {
        let change = match self.subscription.recv().await {
            Ok(change) => change,
            Err(FeedError::Lagged(skipped)) => {
                warn!(
                    "{} fell {} changes behind, re-reading room {}",
                    self.participant_id, skipped, self.room.room_id
                );
                self.resync().await?
            }
            Err(FeedError::Closed) => {
                return Err(RoomSessionError::FeedClosed(self.room.room_id.clone()))
            }
        };
        self.handle_change(&change).await?;
        Ok(change)
    }

    /// Builds the change from the local row to the stored one.
    async fn resync(&self) -> Result<RoomChange, RoomSessionError> {
        let fresh = self.game_service.get_room(&self.room.room_id).await?;
        // Our own final move may already have put the completed row here; the
        // row before it is unknown then.
        let previous = if self.room.status == RoomStatus::Completed {
            None
        } else {
            Some(self.room.clone())
        };
        Ok(RoomChange::updated(previous, fresh))
    }

    /// Blocks on the feed until it is this participant's turn. `false` if the
    /// room finished first.
    pub async fn wait_for_turn(&mut self) -> Result<bool, RoomSessionError> {
        while !self.finished {
            if self.is_my_turn() {
                return Ok(true);
            }
            self.next_change().await?;
        }
        Ok(false)
    }

    /// Drains the feed until the room completes or is cancelled.
    pub async fn run_until_finished(&mut self) -> Result<Option<PlayerStats>, RoomSessionError> {
        while !self.finished {
            self.next_change().await?;
        }
        Ok(self.recorded.clone())
    }

    fn observe(&mut self, room: GameRoom) {
        if room.version > self.room.version {
            self.room = room;
        }
    }
}
