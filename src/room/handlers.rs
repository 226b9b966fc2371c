use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::RoomService,
    types::{RoomCreateRequest, RoomCreatedResponse, RoomResponse},
};
use crate::shared::{parse_id, AppError, AppState};

/// HTTP handler for creating a new room
///
/// POST /api/rooms
#[instrument(name = "create_room", skip(state, payload))]
pub async fn create_room(
    State(state): State<AppState>,
    payload: Result<Json<RoomCreateRequest>, JsonRejection>,
) -> Result<Json<RoomCreatedResponse>, AppError> {
    let Json(request) = payload?;
    let service = RoomService::new(Arc::clone(&state.room_repository));
    let id = service.create_room(request).await?;

    Ok(Json(RoomCreatedResponse { id }))
}

/// HTTP handler for listing all rooms
///
/// GET /api/rooms
#[instrument(name = "list_rooms", skip(state))]
pub async fn list_rooms(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoomResponse>>, AppError> {
    let service = RoomService::new(Arc::clone(&state.room_repository));
    let rooms = service.list_rooms().await?;

    info!(room_count = rooms.len(), "Rooms listed successfully");
    Ok(Json(rooms))
}

/// GET /api/rooms/:room_id
#[instrument(name = "get_room", skip(state))]
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomResponse>, AppError> {
    let room_id = parse_id(&room_id, "room")?;
    let service = RoomService::new(Arc::clone(&state.room_repository));
    let room = service.get_room(room_id).await?;

    Ok(Json(room.into()))
}
