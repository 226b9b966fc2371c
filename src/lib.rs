// Library crate for the live Q&A room server
// This file exposes the public API for integration tests

pub mod config;
pub mod event;
pub mod message;
pub mod room;
pub mod routes;
pub mod shared;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use config::AppConfig;
pub use event::{EventDispatcher, EventPublisher, EventSink, Listener, RoomEvent, RoomHub};
pub use message::repository::{InMemoryMessageRepository, MessageRepository};
pub use room::repository::{InMemoryRoomRepository, RoomRepository};
pub use routes::build_router;
pub use shared::{AppError, AppState};
