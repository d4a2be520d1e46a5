pub mod errors;
pub mod game_room_repository;
pub mod in_memory;
pub mod player_stats_repository;
pub mod subscription_repository;
