pub mod game_room;
pub mod game_state;
pub mod player_stats;
pub mod requests;
pub mod responses;
pub mod room_change;
pub mod subscription;
