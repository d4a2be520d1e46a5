pub mod errors;
pub mod game_service;
pub mod room_service;
pub mod room_session;
pub mod stats_service;
pub mod subscription_service;
