use std::sync::Arc;

use shared::repositories::game_room_repository::GameRoomRepository;
use shared::repositories::player_stats_repository::PlayerStatsRepository;
use shared::services::game_service::GameService;
use shared::services::room_service::RoomService;
use shared::services::stats_service::StatsService;

#[derive(Clone)]
pub struct AppState {
    pub room_service: Arc<RoomService>,
    pub game_service: Arc<GameService>,
    pub stats_service: Arc<StatsService>,
}

impl AppState {
    pub fn new(
        room_repository: Arc<dyn GameRoomRepository + Send + Sync>,
        stats_repository: Arc<dyn PlayerStatsRepository + Send + Sync>,
        open_rooms_page_size: usize,
    ) -> Self {
        AppState {
            room_service: Arc::new(
                RoomService::new(room_repository.clone()).with_page_size(open_rooms_page_size),
            ),
            game_service: Arc::new(GameService::new(room_repository)),
            stats_service: Arc::new(StatsService::new(stats_repository)),
        }
    }
}
