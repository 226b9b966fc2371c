use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{models::MessageModel, repository::MessageRepository};
use crate::event::{EventPublisher, RoomEvent};
use crate::room::{repository::RoomRepository, RoomService};
use crate::shared::AppError;

/// Service for message business logic
///
/// Every mutation commits to storage first and only then hands the matching
/// event to the publisher. A failed storage call returns before anything is
/// published, and fan-out never feeds back into the result.
pub struct MessageService {
    rooms: RoomService,
    repository: Arc<dyn MessageRepository + Send + Sync>,
    publisher: EventPublisher,
}

impl MessageService {
    pub fn new(
        room_repository: Arc<dyn RoomRepository + Send + Sync>,
        repository: Arc<dyn MessageRepository + Send + Sync>,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            rooms: RoomService::new(room_repository),
            repository,
            publisher,
        }
    }

    /// Posts a message to a room and announces it to the room's listeners
    #[instrument(skip(self, text))]
    pub async fn create_message(&self, room_id: Uuid, text: String) -> Result<Uuid, AppError> {
        self.rooms.get_room(room_id).await?;

        let message = MessageModel::new(room_id, text);
        self.repository.create_message(&message).await?;
        info!(room_id = %room_id, message_id = %message.id, "Message created");

        self.publisher.publish(
            room_id,
            RoomEvent::MessageCreated {
                id: message.id,
                message: message.message,
            },
        );
        Ok(message.id)
    }

    #[instrument(skip(self))]
    pub async fn list_messages(&self, room_id: Uuid) -> Result<Vec<MessageModel>, AppError> {
        self.rooms.get_room(room_id).await?;
        self.repository.list_messages(room_id).await
    }

    /// Loads a message, treating a message from another room as missing
    #[instrument(skip(self))]
    pub async fn get_message(
        &self,
        room_id: Uuid,
        message_id: Uuid,
    ) -> Result<MessageModel, AppError> {
        self.rooms.get_room(room_id).await?;

        match self.repository.get_message(message_id).await? {
            Some(message) if message.room_id == room_id => Ok(message),
            _ => {
                warn!(room_id = %room_id, message_id = %message_id, "Message not found in room");
                Err(AppError::NotFound("message not found".to_string()))
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn react(&self, room_id: Uuid, message_id: Uuid) -> Result<i64, AppError> {
        self.get_message(room_id, message_id).await?;

        let count = self.repository.increment_reaction(message_id).await?;
        info!(room_id = %room_id, message_id = %message_id, count, "Reaction added");

        self.publisher.publish(
            room_id,
            RoomEvent::MessageReactionIncreased {
                id: message_id,
                count,
            },
        );
        Ok(count)
    }

    #[instrument(skip(self))]
    pub async fn remove_reaction(&self, room_id: Uuid, message_id: Uuid) -> Result<i64, AppError> {
        self.get_message(room_id, message_id).await?;

        let count = self.repository.decrement_reaction(message_id).await?;
        info!(room_id = %room_id, message_id = %message_id, count, "Reaction removed");

        self.publisher.publish(
            room_id,
            RoomEvent::MessageReactionDecreased {
                id: message_id,
                count,
            },
        );
        Ok(count)
    }

    #[instrument(skip(self))]
    pub async fn mark_answered(&self, room_id: Uuid, message_id: Uuid) -> Result<(), AppError> {
        self.get_message(room_id, message_id).await?;

        self.repository.mark_answered(message_id).await?;
        info!(room_id = %room_id, message_id = %message_id, "Message marked as answered");

        self.publisher
            .publish(room_id, RoomEvent::MessageAnswered { id: message_id });
        Ok(())
    }
}
