use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::event::{EventPublisher, RoomHub};
use crate::message::repository::MessageRepository;
use crate::room::repository::RoomRepository;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub room_repository: Arc<dyn RoomRepository + Send + Sync>,
    pub message_repository: Arc<dyn MessageRepository + Send + Sync>,
    pub hub: RoomHub,
    pub publisher: EventPublisher,
    /// Cancelled on process shutdown; every live connection listens on a child token
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        room_repository: Arc<dyn RoomRepository + Send + Sync>,
        message_repository: Arc<dyn MessageRepository + Send + Sync>,
        hub: RoomHub,
        publisher: EventPublisher,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            room_repository,
            message_repository,
            hub,
            publisher,
            shutdown,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::DatabaseError(msg) => {
                error!(error = %msg, "Request failed with database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "something went wrong".to_string(),
                )
            }
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection, "Rejected request body");
        AppError::BadRequest("invalid json".to_string())
    }
}

/// Parse a UUID path segment, naming the segment in the error
pub fn parse_id(raw: &str, what: &str) -> Result<uuid::Uuid, AppError> {
    uuid::Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("invalid {} id", what)))
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::event::{DeliveryError, EventDispatcher, EventSink, RoomEvent};
    use crate::message::repository::InMemoryMessageRepository;
    use crate::room::repository::InMemoryRoomRepository;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use uuid::Uuid;

    #[derive(Debug, Clone, Copy)]
    enum SinkMode {
        Healthy,
        Failing,
        Stalled,
        /// Neither writes nor the close handshake ever complete
        Unresponsive,
    }

    /// Event sink that records everything written to it
    pub struct RecordingSink {
        messages: Mutex<Vec<String>>,
        closed: AtomicBool,
        mode: SinkMode,
    }

    impl RecordingSink {
        fn with_mode(mode: SinkMode) -> Arc<Self> {
            Arc::new(Self {
                messages: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
                mode,
            })
        }

        pub fn new() -> Arc<Self> {
            Self::with_mode(SinkMode::Healthy)
        }

        /// Every write fails
        pub fn failing() -> Arc<Self> {
            Self::with_mode(SinkMode::Failing)
        }

        /// Every write hangs forever
        pub fn stalled() -> Arc<Self> {
            Self::with_mode(SinkMode::Stalled)
        }

        /// Writes and close both hang forever, like a peer that stopped reading
        pub fn unresponsive() -> Arc<Self> {
            Self::with_mode(SinkMode::Unresponsive)
        }

        pub fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }

        pub fn events(&self) -> Vec<RoomEvent> {
            self.messages()
                .iter()
                .map(|m| serde_json::from_str(m).unwrap())
                .collect()
        }

        pub fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn deliver(&self, payload: &str) -> Result<(), DeliveryError> {
            match self.mode {
                SinkMode::Healthy => {
                    self.messages.lock().unwrap().push(payload.to_string());
                    Ok(())
                }
                SinkMode::Failing => Err(DeliveryError::SendFailed("broken pipe".to_string())),
                SinkMode::Stalled | SinkMode::Unresponsive => std::future::pending().await,
            }
        }

        async fn close(&self) -> Result<(), DeliveryError> {
            if let SinkMode::Unresponsive = self.mode {
                return std::future::pending().await;
            }
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Poll `condition` until it holds, panicking after two seconds
    pub async fn wait_for(condition: impl Fn() -> bool) {
        for _ in 0..400 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not met within timeout");
    }

    /// Wait until the hub reports `expected` listeners for a room
    pub async fn wait_for_listeners(hub: &RoomHub, room_id: Uuid, expected: usize) {
        for _ in 0..400 {
            if hub.listener_count(room_id).await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!(
            "room {} has {} listeners, expected {}",
            room_id,
            hub.listener_count(room_id).await,
            expected
        );
    }

    /// Builder for creating AppState with overrides for testing
    pub struct AppStateBuilder {
        room_repository: Option<Arc<dyn RoomRepository + Send + Sync>>,
        message_repository: Option<Arc<dyn MessageRepository + Send + Sync>>,
        hub: Option<RoomHub>,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                room_repository: None,
                message_repository: None,
                hub: None,
            }
        }

        pub fn with_room_repository(mut self, repo: Arc<dyn RoomRepository + Send + Sync>) -> Self {
            self.room_repository = Some(repo);
            self
        }

        pub fn with_message_repository(
            mut self,
            repo: Arc<dyn MessageRepository + Send + Sync>,
        ) -> Self {
            self.message_repository = Some(repo);
            self
        }

        pub fn with_hub(mut self, hub: RoomHub) -> Self {
            self.hub = Some(hub);
            self
        }

        /// Must be called inside a tokio runtime, the dispatcher is spawned here
        pub fn build(self) -> AppState {
            let hub = self.hub.unwrap_or_default();
            let (publisher, _handle) = EventDispatcher::spawn(hub.clone());

            AppState {
                room_repository: self
                    .room_repository
                    .unwrap_or_else(|| Arc::new(InMemoryRoomRepository::new())),
                message_repository: self
                    .message_repository
                    .unwrap_or_else(|| Arc::new(InMemoryMessageRepository::new())),
                hub,
                publisher,
                shutdown: CancellationToken::new(),
            }
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}
