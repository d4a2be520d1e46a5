use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use serde_dynamo::aws_sdk_dynamodb_1::from_item;

#[cfg(test)]
use mockall::automock;

use crate::models::player_stats::PlayerStats;
use crate::repositories::errors::player_stats_repository_errors::PlayerStatsRepositoryError;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait PlayerStatsRepository: Send + Sync {
    /// Adds one played game (and one win if `won`) and returns the new totals.
    async fn record_game(
        &self,
        user_id: &str,
        won: bool,
    ) -> Result<PlayerStats, PlayerStatsRepositoryError>;

    async fn get_stats(
        &self,
        user_id: &str,
    ) -> Result<Option<PlayerStats>, PlayerStatsRepositoryError>;
}

pub struct DynamoDbPlayerStatsRepository {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbPlayerStatsRepository {
    pub fn new(client: Client, table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
        }
    }
}

#[async_trait]
impl PlayerStatsRepository for DynamoDbPlayerStatsRepository {
    async fn record_game(
        &self,
        user_id: &str,
        won: bool,
    ) -> Result<PlayerStats, PlayerStatsRepositoryError> {
        let output = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("user_id", AttributeValue::S(user_id.to_string()))
            .update_expression("ADD games_played :one, games_won :won")
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .expression_attribute_values(
                ":won",
                AttributeValue::N(if won { "1" } else { "0" }.to_string()),
            )
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|e| PlayerStatsRepositoryError::DynamoDb(e.to_string()))?;

        match output.attributes {
            Some(item) => {
                from_item(item).map_err(|e| PlayerStatsRepositoryError::Serialization(e.to_string()))
            }
            None => Err(PlayerStatsRepositoryError::DynamoDb(format!(
                "update of stats for {} returned no attributes",
                user_id
            ))),
        }
    }

    async fn get_stats(
        &self,
        user_id: &str,
    ) -> Result<Option<PlayerStats>, PlayerStatsRepositoryError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("user_id", AttributeValue::S(user_id.to_string()))
            .send()
            .await
            .map_err(|e| PlayerStatsRepositoryError::DynamoDb(e.to_string()))?;

        if let Some(item) = result.item {
            let stats: PlayerStats = from_item(item)
                .map_err(|e| PlayerStatsRepositoryError::Serialization(e.to_string()))?;
            Ok(Some(stats))
        } else {
            Ok(None)
        }
    }
}
