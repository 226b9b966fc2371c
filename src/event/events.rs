use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events pushed to the listeners of a room
///
/// Events describe a state change that has already been committed to
/// storage. They carry enough data for a client to patch its local view
/// without re-fetching. The room an event belongs to travels next to it
/// when publishing and is never part of the serialized payload.
///
/// Wire shape: `{"kind": "message_created", "value": {"id": "...", "message": "..."}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RoomEvent {
    /// A new message was posted to the room
    MessageCreated { id: Uuid, message: String },

    /// A message received a reaction
    MessageReactionIncreased { id: Uuid, count: i64 },

    /// A reaction was removed from a message
    MessageReactionDecreased { id: Uuid, count: i64 },

    /// A message was marked as answered
    MessageAnswered { id: Uuid },
}

impl RoomEvent {
    /// The message this event refers to
    pub fn message_id(&self) -> Uuid {
        match self {
            RoomEvent::MessageCreated { id, .. } => *id,
            RoomEvent::MessageReactionIncreased { id, .. } => *id,
            RoomEvent::MessageReactionDecreased { id, .. } => *id,
            RoomEvent::MessageAnswered { id } => *id,
        }
    }

    /// The `kind` tag as it appears on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            RoomEvent::MessageCreated { .. } => "message_created",
            RoomEvent::MessageReactionIncreased { .. } => "message_reaction_increased",
            RoomEvent::MessageReactionDecreased { .. } => "message_reaction_decreased",
            RoomEvent::MessageAnswered { .. } => "message_answered",
        }
    }
}
