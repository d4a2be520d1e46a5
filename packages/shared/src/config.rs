use thiserror::Error;

pub const DEFAULT_OPEN_ROOMS_PAGE_SIZE: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable must be set")]
    Missing(&'static str),
    #[error("{name} must be a positive integer, got {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Deployment settings, read once from the Lambda environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub game_rooms_table: String,
    pub player_stats_table: String,
    pub room_subscriptions_table: String,
    pub websocket_api_endpoint: Option<String>,
    pub open_rooms_page_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let open_rooms_page_size = match lookup("OPEN_ROOMS_PAGE_SIZE") {
            Some(value) => match value.parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "OPEN_ROOMS_PAGE_SIZE",
                        value,
                    })
                }
            },
            None => DEFAULT_OPEN_ROOMS_PAGE_SIZE,
        };

        // Format: https://{api-id}.execute-api.{region}.amazonaws.com/{stage}
        let websocket_api_endpoint = lookup("WEBSOCKET_API_ENDPOINT").or_else(|| {
            let api_id = lookup("WEBSOCKET_API_ID")?;
            let region = lookup("AWS_REGION").unwrap_or_else(|| "eu-west-1".to_string());
            let stage = lookup("STAGE").unwrap_or_else(|| "dev".to_string());
            Some(format!(
                "https://{}.execute-api.{}.amazonaws.com/{}",
                api_id, region, stage
            ))
        });

        Ok(Config {
            game_rooms_table: required("GAME_ROOMS_TABLE")?,
            player_stats_table: required("PLAYER_STATS_TABLE")?,
            room_subscriptions_table: required("ROOM_SUBSCRIPTIONS_TABLE")?,
            websocket_api_endpoint,
            open_rooms_page_size,
        })
    }

    pub fn websocket_endpoint(&self) -> Result<&str, ConfigError> {
        self.websocket_api_endpoint
            .as_deref()
            .ok_or(ConfigError::Missing("WEBSOCKET_API_ENDPOINT"))
    }
}
