use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::{
    config::DEFAULT_OPEN_ROOMS_PAGE_SIZE,
    models::{game_room::GameRoom, game_state::GameType},
    repositories::game_room_repository::GameRoomRepository,
    services::errors::room_service_errors::RoomServiceError,
};

/// Room lifecycle outside of the games themselves: creating, listing, joining, cancelling.
#[derive(Clone)]
pub struct RoomService {
    repository: Arc<dyn GameRoomRepository + Send + Sync>,
    open_rooms_page_size: usize,
}

impl RoomService {
    pub fn new(repository: Arc<dyn GameRoomRepository + Send + Sync>) -> Self {
        RoomService {
            repository,
            open_rooms_page_size: DEFAULT_OPEN_ROOMS_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, open_rooms_page_size: usize) -> Self {
        self.open_rooms_page_size = open_rooms_page_size;
        self
    }

    pub async fn create_room(
        &self,
        game_type: GameType,
        creator_id: &str,
    ) -> Result<GameRoom, RoomServiceError> {
        validate_user_id(creator_id)?;

        let room = GameRoom::new(game_type, creator_id);
        self.repository.create_room(&room).await?;

        info!(
            "Created {} room {} for {}",
            game_type, room.room_id, creator_id
        );
        Ok(room)
    }

    pub async fn get_room(&self, room_id: &str) -> Result<GameRoom, RoomServiceError> {
        self.repository
            .get_room(room_id)
            .await?
            .ok_or_else(|| RoomServiceError::NotFound(room_id.to_string()))
    }

    /// Newest open rooms first, one page.
    pub async fn list_open_rooms(&self) -> Result<Vec<GameRoom>, RoomServiceError> {
        let rooms = self
            .repository
            .list_open_rooms(self.open_rooms_page_size)
            .await?;
        Ok(rooms)
    }

    /// Claims the second seat. Losing the race to another joiner is a
    /// `JoinConflict`; the caller decides whether to pick another room.
    pub async fn join_room(
        &self,
        room_id: &str,
        joiner_id: &str,
    ) -> Result<GameRoom, RoomServiceError> {
        validate_user_id(joiner_id)?;

        let room = self.get_room(room_id).await?;
        if room.player1_id == joiner_id {
            return Err(RoomServiceError::CannotJoinOwnRoom);
        }

        match self.repository.claim_seat(room_id, joiner_id).await? {
            Some(joined) => {
                info!("Player {} joined room {}", joiner_id, room_id);
                Ok(joined)
            }
            None => {
                warn!(
                    "Player {} lost room {}, it is no longer available",
                    joiner_id, room_id
                );
                Err(RoomServiceError::JoinConflict(room_id.to_string()))
            }
        }
    }

    pub async fn cancel_room(
        &self,
        room_id: &str,
        caller_id: &str,
    ) -> Result<GameRoom, RoomServiceError> {
        let room = self.get_room(room_id).await?;
        if !room.is_participant(caller_id) {
            return Err(RoomServiceError::NotParticipant(room_id.to_string()));
        }
        if room.status.is_terminal() {
            return Err(RoomServiceError::InvalidState(format!(
                "room {} is already {}",
                room_id, room.status
            )));
        }

        match self.repository.cancel_room(room_id, Utc::now()).await? {
            Some(cancelled) => {
                info!("Room {} cancelled by {}", room_id, caller_id);
                Ok(cancelled)
            }
            None => Err(RoomServiceError::InvalidState(format!(
                "room {} finished before it could be cancelled",
                room_id
            ))),
        }
    }
}

fn validate_user_id(user_id: &str) -> Result<(), RoomServiceError> {
    if user_id.trim().is_empty() {
        return Err(RoomServiceError::ValidationError(
            "user id cannot be empty".to_string(),
        ));
    }
    Ok(())
}
