// Real-time fan-out core
//
// The hub owns the room -> listeners registry. Request handlers hand events
// to the dispatcher through an `EventPublisher`; the dispatcher runs each
// fan-out on the hub off the request path.

// Public API - what other modules can use
pub use dispatcher::{EventDispatcher, EventPublisher};
pub use events::RoomEvent;
pub use hub::{RoomHub, DEFAULT_WRITE_TIMEOUT};
pub use listener::{DeliveryError, EventSink, Listener, ListenerId};

// Internal modules
mod dispatcher;
mod events;
mod hub;
mod listener;
