use axum::{
    http::{header, HeaderName, Method},
    routing::{get, patch},
    Router,
};
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::message;
use crate::room;
use crate::shared::AppState;
use crate::websockets;

/// Builds the full HTTP surface: the websocket endpoint plus the JSON API
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/rooms", get(room::list_rooms).post(room::create_room))
        .route("/rooms/:room_id", get(room::get_room))
        .route(
            "/rooms/:room_id/messages",
            get(message::list_messages).post(message::create_message),
        )
        .route(
            "/rooms/:room_id/messages/:message_id",
            get(message::get_message),
        )
        .route(
            "/rooms/:room_id/messages/:message_id/react",
            patch(message::react_to_message).delete(message::remove_reaction_from_message),
        )
        .route(
            "/rooms/:room_id/messages/:message_id/answer",
            patch(message::mark_message_answered),
        );

    Router::new()
        .route("/subscribe/:room_id", get(websockets::subscribe))
        .nest("/api", api)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::PATCH,
        ])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .expose_headers([header::LINK])
        .max_age(Duration::from_secs(300))
}
