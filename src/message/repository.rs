use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::models::MessageModel;
use crate::shared::AppError;

/// Trait for message repository operations
///
/// Reaction and answer updates fail with `AppError::NotFound` when the
/// message does not exist.
#[async_trait]
pub trait MessageRepository {
    async fn create_message(&self, message: &MessageModel) -> Result<(), AppError>;
    async fn get_message(&self, message_id: Uuid) -> Result<Option<MessageModel>, AppError>;
    async fn list_messages(&self, room_id: Uuid) -> Result<Vec<MessageModel>, AppError>;

    /// Returns the new reaction count
    async fn increment_reaction(&self, message_id: Uuid) -> Result<i64, AppError>;

    /// Returns the new reaction count, which never drops below zero
    async fn decrement_reaction(&self, message_id: Uuid) -> Result<i64, AppError>;

    async fn mark_answered(&self, message_id: Uuid) -> Result<(), AppError>;
}

fn message_not_found(message_id: Uuid) -> AppError {
    warn!(message_id = %message_id, "Message not found");
    AppError::NotFound("message not found".to_string())
}

/// In-memory implementation of MessageRepository for development and testing
pub struct InMemoryMessageRepository {
    messages: RwLock<HashMap<Uuid, MessageModel>>,
}

impl Default for InMemoryMessageRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self {
            messages: RwLock::new(HashMap::new()),
        }
    }

    async fn update_count(
        &self,
        message_id: Uuid,
        update: impl FnOnce(i64) -> i64,
    ) -> Result<i64, AppError> {
        let mut messages = self.messages.write().await;
        let message = messages
            .get_mut(&message_id)
            .ok_or_else(|| message_not_found(message_id))?;
        message.reaction_count = update(message.reaction_count);
        Ok(message.reaction_count)
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    #[instrument(skip(self, message))]
    async fn create_message(&self, message: &MessageModel) -> Result<(), AppError> {
        debug!(message_id = %message.id, room_id = %message.room_id, "Creating message in memory");

        let mut messages = self.messages.write().await;
        if messages.contains_key(&message.id) {
            warn!(message_id = %message.id, "Message already exists in memory");
            return Err(AppError::DatabaseError("Message already exists".to_string()));
        }
        messages.insert(message.id, message.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_message(&self, message_id: Uuid) -> Result<Option<MessageModel>, AppError> {
        Ok(self.messages.read().await.get(&message_id).cloned())
    }

    #[instrument(skip(self))]
    async fn list_messages(&self, room_id: Uuid) -> Result<Vec<MessageModel>, AppError> {
        let messages: Vec<MessageModel> = self
            .messages
            .read()
            .await
            .values()
            .filter(|m| m.room_id == room_id)
            .cloned()
            .collect();

        debug!(room_id = %room_id, message_count = messages.len(), "Messages listed from memory");
        Ok(messages)
    }

    #[instrument(skip(self))]
    async fn increment_reaction(&self, message_id: Uuid) -> Result<i64, AppError> {
        self.update_count(message_id, |count| count + 1).await
    }

    #[instrument(skip(self))]
    async fn decrement_reaction(&self, message_id: Uuid) -> Result<i64, AppError> {
        self.update_count(message_id, |count| (count - 1).max(0))
            .await
    }

    #[instrument(skip(self))]
    async fn mark_answered(&self, message_id: Uuid) -> Result<(), AppError> {
        let mut messages = self.messages.write().await;
        let message = messages
            .get_mut(&message_id)
            .ok_or_else(|| message_not_found(message_id))?;
        message.answered = true;
        Ok(())
    }
}

/// PostgreSQL implementation of message repository
pub struct PostgresMessageRepository {
    pool: PgPool,
}

impl PostgresMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn update_count(&self, message_id: Uuid, sql: &str) -> Result<i64, AppError> {
        let count: Option<i64> = sqlx::query_scalar(sql)
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, message_id = %message_id, "Failed to update reaction count");
                AppError::DatabaseError(e.to_string())
            })?;

        count.ok_or_else(|| message_not_found(message_id))
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    #[instrument(skip(self, message))]
    async fn create_message(&self, message: &MessageModel) -> Result<(), AppError> {
        debug!(message_id = %message.id, room_id = %message.room_id, "Creating message in database");

        sqlx::query(
            "INSERT INTO messages (id, room_id, message, reaction_count, answered) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(message.id)
        .bind(message.room_id)
        .bind(&message.message)
        .bind(message.reaction_count)
        .bind(message.answered)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to insert message");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_message(&self, message_id: Uuid) -> Result<Option<MessageModel>, AppError> {
        sqlx::query_as::<_, MessageModel>(
            "SELECT id, room_id, message, reaction_count, answered FROM messages WHERE id = $1",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, message_id = %message_id, "Failed to get message");
            AppError::DatabaseError(e.to_string())
        })
    }

    #[instrument(skip(self))]
    async fn list_messages(&self, room_id: Uuid) -> Result<Vec<MessageModel>, AppError> {
        sqlx::query_as::<_, MessageModel>(
            "SELECT id, room_id, message, reaction_count, answered FROM messages WHERE room_id = $1",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, room_id = %room_id, "Failed to get room messages");
            AppError::DatabaseError(e.to_string())
        })
    }

    #[instrument(skip(self))]
    async fn increment_reaction(&self, message_id: Uuid) -> Result<i64, AppError> {
        self.update_count(
            message_id,
            "UPDATE messages SET reaction_count = reaction_count + 1 WHERE id = $1 RETURNING reaction_count",
        )
        .await
    }

    #[instrument(skip(self))]
    async fn decrement_reaction(&self, message_id: Uuid) -> Result<i64, AppError> {
        self.update_count(
            message_id,
            "UPDATE messages SET reaction_count = GREATEST(reaction_count - 1, 0) WHERE id = $1 RETURNING reaction_count",
        )
        .await
    }

    #[instrument(skip(self))]
    async fn mark_answered(&self, message_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE messages SET answered = true WHERE id = $1")
            .bind(message_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, message_id = %message_id, "Failed to mark message as answered");
                AppError::DatabaseError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(message_not_found(message_id));
        }
        Ok(())
    }
}
