use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request payload for posting a message to a room
#[derive(Debug, Deserialize)]
pub struct MessageCreateRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageCreatedResponse {
    pub id: Uuid,
}

/// Response for react / unreact
#[derive(Debug, Serialize, Deserialize)]
pub struct ReactionCountResponse {
    pub count: i64,
}
