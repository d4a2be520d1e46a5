use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_attribute_value, to_item};

#[cfg(test)]
use mockall::automock;

use crate::models::game_room::{GameRoom, RoomStatus};
use crate::repositories::errors::game_room_repository_errors::GameRoomRepositoryError;

pub const OPEN_ROOMS_INDEX: &str = "StatusCreatedAtIndex";

/// The shared room store. Every write is a single atomic statement against one row.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GameRoomRepository: Send + Sync {
    async fn create_room(&self, room: &GameRoom) -> Result<(), GameRoomRepositoryError>;

    async fn get_room(&self, room_id: &str) -> Result<Option<GameRoom>, GameRoomRepositoryError>;

    /// Waiting rooms without a second player, newest first.
    async fn list_open_rooms(&self, limit: usize)
        -> Result<Vec<GameRoom>, GameRoomRepositoryError>;

    /// Sets `player2_id` and moves the room to in progress, but only while the
    /// seat is still empty. `None` means somebody else claimed it first.
    async fn claim_seat(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> Result<Option<GameRoom>, GameRoomRepositoryError>;

    /// Writes `room` if the stored row is still at `expected_version`.
    async fn replace_room(
        &self,
        room: &GameRoom,
        expected_version: u64,
    ) -> Result<bool, GameRoomRepositoryError>;

    /// Moves a waiting or in-progress room to cancelled. `None` if it had already finished.
    async fn cancel_room(
        &self,
        room_id: &str,
        cancelled_at: DateTime<Utc>,
    ) -> Result<Option<GameRoom>, GameRoomRepositoryError>;
}

pub struct DynamoDbGameRoomRepository {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbGameRoomRepository {
    pub fn new(client: Client, table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
        }
    }

    fn status_value(status: RoomStatus) -> AttributeValue {
        AttributeValue::S(status.as_str().to_string())
    }

    fn room_from_attributes(
        attributes: Option<std::collections::HashMap<String, AttributeValue>>,
    ) -> Result<Option<GameRoom>, GameRoomRepositoryError> {
        attributes
            .map(|item| {
                from_item(item).map_err(|e| GameRoomRepositoryError::Serialization(e.to_string()))
            })
            .transpose()
    }
}

#[async_trait]
impl GameRoomRepository for DynamoDbGameRoomRepository {
    async fn create_room(&self, room: &GameRoom) -> Result<(), GameRoomRepositoryError> {
        let item =
            to_item(room).map_err(|e| GameRoomRepositoryError::Serialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(room_id)")
            .send()
            .await
            .map_err(|e| GameRoomRepositoryError::DynamoDb(e.to_string()))?;

        Ok(())
    }

    async fn get_room(&self, room_id: &str) -> Result<Option<GameRoom>, GameRoomRepositoryError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("room_id", AttributeValue::S(room_id.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| GameRoomRepositoryError::DynamoDb(e.to_string()))?;

        Self::room_from_attributes(result.item)
    }

    async fn list_open_rooms(
        &self,
        limit: usize,
    ) -> Result<Vec<GameRoom>, GameRoomRepositoryError> {
        let query_result = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(OPEN_ROOMS_INDEX)
            .key_condition_expression("#status = :waiting")
            .filter_expression("attribute_not_exists(player2_id)")
            .expression_attribute_names("#status", "status")
            .expression_attribute_values(":waiting", Self::status_value(RoomStatus::Waiting))
            .scan_index_forward(false)
            .limit(i32::try_from(limit).unwrap_or(i32::MAX))
            .send()
            .await
            .map_err(|e| GameRoomRepositoryError::DynamoDb(e.to_string()))?;

        let mut rooms = Vec::new();
        for item in query_result.items.unwrap_or_default() {
            let room: GameRoom = from_item(item)
                .map_err(|e| GameRoomRepositoryError::Serialization(e.to_string()))?;
            rooms.push(room);
        }
        rooms.truncate(limit);

        Ok(rooms)
    }

    async fn claim_seat(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> Result<Option<GameRoom>, GameRoomRepositoryError> {
        // The predicate is the whole race arbitration: only one writer can see the seat empty.
        let update_result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("room_id", AttributeValue::S(room_id.to_string()))
            .update_expression(
                "SET player2_id = :player2, #status = :in_progress, #version = #version + :one",
            )
            .condition_expression(
                "attribute_exists(room_id) AND attribute_not_exists(player2_id) AND #status = :waiting",
            )
            .expression_attribute_names("#status", "status")
            .expression_attribute_names("#version", "version")
            .expression_attribute_values(":player2", AttributeValue::S(player_id.to_string()))
            .expression_attribute_values(
                ":in_progress",
                Self::status_value(RoomStatus::InProgress),
            )
            .expression_attribute_values(":waiting", Self::status_value(RoomStatus::Waiting))
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        match update_result {
            Ok(output) => Self::room_from_attributes(output.attributes),
            Err(e) => {
                if e.as_service_error()
                    .is_some_and(|err| err.is_conditional_check_failed_exception())
                {
                    return Ok(None);
                }
                Err(GameRoomRepositoryError::DynamoDb(e.to_string()))
            }
        }
    }

    async fn replace_room(
        &self,
        room: &GameRoom,
        expected_version: u64,
    ) -> Result<bool, GameRoomRepositoryError> {
        let item =
            to_item(room).map_err(|e| GameRoomRepositoryError::Serialization(e.to_string()))?;

        let put_result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("#version = :expected")
            .expression_attribute_names("#version", "version")
            .expression_attribute_values(
                ":expected",
                AttributeValue::N(expected_version.to_string()),
            )
            .send()
            .await;

        match put_result {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.as_service_error()
                    .is_some_and(|err| err.is_conditional_check_failed_exception())
                {
                    return Ok(false);
                }
                Err(GameRoomRepositoryError::DynamoDb(e.to_string()))
            }
        }
    }

    async fn cancel_room(
        &self,
        room_id: &str,
        cancelled_at: DateTime<Utc>,
    ) -> Result<Option<GameRoom>, GameRoomRepositoryError> {
        let cancelled_at = to_attribute_value(cancelled_at)
            .map_err(|e| GameRoomRepositoryError::Serialization(e.to_string()))?;

        let update_result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("room_id", AttributeValue::S(room_id.to_string()))
            .update_expression(
                "SET #status = :cancelled, completed_at = :cancelled_at, #version = #version + :one",
            )
            .condition_expression(
                "attribute_exists(room_id) AND #status IN (:waiting, :in_progress)",
            )
            .expression_attribute_names("#status", "status")
            .expression_attribute_names("#version", "version")
            .expression_attribute_values(":cancelled", Self::status_value(RoomStatus::Cancelled))
            .expression_attribute_values(":cancelled_at", cancelled_at)
            .expression_attribute_values(":waiting", Self::status_value(RoomStatus::Waiting))
            .expression_attribute_values(
                ":in_progress",
                Self::status_value(RoomStatus::InProgress),
            )
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        match update_result {
            Ok(output) => Self::room_from_attributes(output.attributes),
            Err(e) => {
                if e.as_service_error()
                    .is_some_and(|err| err.is_conditional_check_failed_exception())
                {
                    return Ok(None);
                }
                Err(GameRoomRepositoryError::DynamoDb(e.to_string()))
            }
        }
    }
}
