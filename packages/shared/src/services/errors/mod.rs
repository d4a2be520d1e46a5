pub mod game_service_errors;
pub mod room_service_errors;
pub mod room_session_errors;
pub mod stats_service_errors;
pub mod subscription_service_errors;
