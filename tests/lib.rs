//! Shared fixtures for the workspace scenario tests.
//!
//! Everything runs against the in-memory stores, so the room feed is the
//! in-process hub and no AWS resources are needed.

use std::sync::Arc;

use shared::feed::RoomChangeHub;
use shared::models::game_room::GameRoom;
use shared::repositories::in_memory::{
    InMemoryGameRoomRepository, InMemoryPlayerStatsRepository, InMemoryRoomSubscriptionRepository,
};
use shared::services::game_service::GameService;
use shared::services::room_service::RoomService;
use shared::services::room_session::RoomSession;
use shared::services::stats_service::StatsService;
use shared::services::subscription_service::RoomSubscriptionService;

/// Installs a compact subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .without_time()
        .with_test_writer()
        .try_init();
}

pub struct Platform {
    pub rooms: Arc<InMemoryGameRoomRepository>,
    pub stats: Arc<InMemoryPlayerStatsRepository>,
    pub subscriptions: Arc<InMemoryRoomSubscriptionRepository>,
    pub room_service: RoomService,
    pub game_service: GameService,
    pub stats_service: StatsService,
    pub subscription_service: RoomSubscriptionService,
}

impl Default for Platform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform {
    pub fn new() -> Self {
        init_tracing();

        let rooms = Arc::new(InMemoryGameRoomRepository::new(RoomChangeHub::default()));
        let stats = Arc::new(InMemoryPlayerStatsRepository::new());
        let subscriptions = Arc::new(InMemoryRoomSubscriptionRepository::new());

        Platform {
            room_service: RoomService::new(rooms.clone()),
            game_service: GameService::new(rooms.clone()),
            stats_service: StatsService::new(stats.clone()),
            subscription_service: RoomSubscriptionService::new(subscriptions.clone()),
            rooms,
            stats,
            subscriptions,
        }
    }

    pub fn hub(&self) -> &RoomChangeHub {
        self.rooms.hub()
    }

    /// A client following `room` as `participant`.
    pub fn session(&self, room: &GameRoom, participant: &str) -> RoomSession {
        match RoomSession::start(
            self.hub(),
            self.game_service.clone(),
            self.stats_service.clone(),
            room.clone(),
            participant,
        ) {
            Ok(session) => session,
            Err(e) => panic!("{} cannot follow room {}: {}", participant, room.room_id, e),
        }
    }
}
