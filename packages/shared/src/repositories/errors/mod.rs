pub mod game_room_repository_errors;
pub mod player_stats_repository_errors;
pub mod subscription_repository_errors;
