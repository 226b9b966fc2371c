use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{
    models::RoomModel,
    repository::RoomRepository,
    types::{RoomCreateRequest, RoomResponse},
};
use crate::shared::AppError;

/// Service for handling room business logic
pub struct RoomService {
    repository: Arc<dyn RoomRepository + Send + Sync>,
}

impl RoomService {
    pub fn new(repository: Arc<dyn RoomRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    /// Creates a new room and returns its generated ID
    #[instrument(skip(self))]
    pub async fn create_room(&self, request: RoomCreateRequest) -> Result<Uuid, AppError> {
        let room = RoomModel::new(request.theme);
        self.repository.create_room(&room).await?;

        info!(room_id = %room.id, theme = %room.theme, "Room created successfully");
        Ok(room.id)
    }

    /// Loads a room, failing with NotFound if it does not exist
    #[instrument(skip(self))]
    pub async fn get_room(&self, room_id: Uuid) -> Result<RoomModel, AppError> {
        self.repository.get_room(room_id).await?.ok_or_else(|| {
            warn!(room_id = %room_id, "Room not found");
            AppError::NotFound("room not found".to_string())
        })
    }

    /// Lists all rooms
    #[instrument(skip(self))]
    pub async fn list_rooms(&self) -> Result<Vec<RoomResponse>, AppError> {
        let rooms = self.repository.list_rooms().await?;
        debug!(room_count = rooms.len(), "Rooms retrieved");

        Ok(rooms.into_iter().map(RoomResponse::from).collect())
    }
}
