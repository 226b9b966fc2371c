use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures::stream::StreamExt;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::connection::Connection;
use super::socket::WebSocketSink;
use crate::room::RoomService;
use crate::shared::{parse_id, AppError, AppState};

/// WebSocket endpoint for listening to a room's events
/// GET /subscribe/:room_id
///
/// The room is validated before the upgrade so that unknown rooms are
/// rejected with a regular HTTP error.
#[instrument(name = "subscribe", skip(state, ws))]
pub async fn subscribe(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, AppError> {
    let room_id = parse_id(&room_id, "room")?;
    RoomService::new(Arc::clone(&state.room_repository))
        .get_room(room_id)
        .await?;

    let ws = ws.map_err(|e| {
        warn!(room_id = %room_id, error = %e, "Failed to upgrade connection");
        AppError::BadRequest("failed to upgrade to ws connection".to_string())
    })?;

    info!(room_id = %room_id, "Room verified, establishing WebSocket connection");
    Ok(ws.on_upgrade(move |socket| handle_websocket_connection(socket, room_id, state)))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(socket: WebSocket, room_id: Uuid, state: AppState) {
    let (sink, stream) = socket.split();
    let connection = Connection::new(
        room_id,
        Arc::new(WebSocketSink::new(sink)),
        Box::new(stream),
        state.hub.clone(),
        &state.shutdown,
    );

    info!(
        room_id = %room_id,
        listener_id = %connection.listener_id(),
        "WebSocket connection established"
    );

    connection.run().await;
}
