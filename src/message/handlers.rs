use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::instrument;

use super::{
    models::MessageModel,
    service::MessageService,
    types::{MessageCreateRequest, MessageCreatedResponse, ReactionCountResponse},
};
use crate::shared::{parse_id, AppError, AppState};

fn service(state: &AppState) -> MessageService {
    MessageService::new(
        Arc::clone(&state.room_repository),
        Arc::clone(&state.message_repository),
        state.publisher.clone(),
    )
}

/// POST /api/rooms/:room_id/messages
#[instrument(name = "create_message", skip(state, payload))]
pub async fn create_message(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    payload: Result<Json<MessageCreateRequest>, JsonRejection>,
) -> Result<Json<MessageCreatedResponse>, AppError> {
    let room_id = parse_id(&room_id, "room")?;
    let Json(request) = payload?;
    let id = service(&state)
        .create_message(room_id, request.message)
        .await?;

    Ok(Json(MessageCreatedResponse { id }))
}

/// GET /api/rooms/:room_id/messages
#[instrument(name = "list_messages", skip(state))]
pub async fn list_messages(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<MessageModel>>, AppError> {
    let room_id = parse_id(&room_id, "room")?;
    let messages = service(&state).list_messages(room_id).await?;

    Ok(Json(messages))
}

/// GET /api/rooms/:room_id/messages/:message_id
#[instrument(name = "get_message", skip(state))]
pub async fn get_message(
    State(state): State<AppState>,
    Path((room_id, message_id)): Path<(String, String)>,
) -> Result<Json<MessageModel>, AppError> {
    let room_id = parse_id(&room_id, "room")?;
    let message_id = parse_id(&message_id, "message")?;
    let message = service(&state).get_message(room_id, message_id).await?;

    Ok(Json(message))
}

/// PATCH /api/rooms/:room_id/messages/:message_id/react
#[instrument(name = "react_to_message", skip(state))]
pub async fn react_to_message(
    State(state): State<AppState>,
    Path((room_id, message_id)): Path<(String, String)>,
) -> Result<Json<ReactionCountResponse>, AppError> {
    let room_id = parse_id(&room_id, "room")?;
    let message_id = parse_id(&message_id, "message")?;
    let count = service(&state).react(room_id, message_id).await?;

    Ok(Json(ReactionCountResponse { count }))
}

/// DELETE /api/rooms/:room_id/messages/:message_id/react
#[instrument(name = "remove_reaction_from_message", skip(state))]
pub async fn remove_reaction_from_message(
    State(state): State<AppState>,
    Path((room_id, message_id)): Path<(String, String)>,
) -> Result<Json<ReactionCountResponse>, AppError> {
    let room_id = parse_id(&room_id, "room")?;
    let message_id = parse_id(&message_id, "message")?;
    let count = service(&state).remove_reaction(room_id, message_id).await?;

    Ok(Json(ReactionCountResponse { count }))
}

/// PATCH /api/rooms/:room_id/messages/:message_id/answer
#[instrument(name = "mark_message_answered", skip(state))]
pub async fn mark_message_answered(
    State(state): State<AppState>,
    Path((room_id, message_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let room_id = parse_id(&room_id, "room")?;
    let message_id = parse_id(&message_id, "message")?;
    service(&state).mark_answered(room_id, message_id).await?;

    Ok(StatusCode::OK)
}
