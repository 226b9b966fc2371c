// Public API
pub use connection::{CloseReason, Connection, ConnectionState};
pub use handler::subscribe;
pub use socket::{SocketError, SocketReceiver, WebSocketSink};

// Internal modules
mod connection;
mod handler;
mod socket;
