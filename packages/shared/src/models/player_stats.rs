use serde::{Deserialize, Serialize};

/// Per-user game counters. Partition key: `user_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub user_id: String,
    #[serde(default)]
    pub games_played: u64,
    #[serde(default)]
    pub games_won: u64,
}

impl PlayerStats {
    pub fn new(user_id: &str) -> Self {
        PlayerStats {
            user_id: user_id.to_string(),
            games_played: 0,
            games_won: 0,
        }
    }
}
