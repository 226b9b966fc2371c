use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::sink::SinkExt;
use futures::stream::{SplitSink, SplitStream, StreamExt};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::event::{DeliveryError, EventSink};

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),
}

/// Read side of a live connection
#[async_trait]
pub trait SocketReceiver: Send {
    /// Next text frame from the client (None once the peer has gone away)
    async fn receive_message(&mut self) -> Result<Option<String>, SocketError>;
}

#[async_trait]
impl SocketReceiver for SplitStream<WebSocket> {
    async fn receive_message(&mut self) -> Result<Option<String>, SocketError> {
        loop {
            match self.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // Binary frames carry nothing for us; ping/pong is answered by axum
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(SocketError::ReceiveFailed(e.to_string())),
            }
        }
    }
}

/// Write side of an axum WebSocket, shared between the hub and the connection task
pub struct WebSocketSink {
    sink: Mutex<SplitSink<WebSocket, Message>>,
}

impl WebSocketSink {
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }
}

#[async_trait]
impl EventSink for WebSocketSink {
    async fn deliver(&self, payload: &str) -> Result<(), DeliveryError> {
        self.sink
            .lock()
            .await
            .send(Message::Text(payload.to_string()))
            .await
            .map_err(|e| DeliveryError::SendFailed(e.to_string()))
    }

    async fn close(&self) -> Result<(), DeliveryError> {
        self.sink
            .lock()
            .await
            .close()
            .await
            .map_err(|e| DeliveryError::SendFailed(e.to_string()))
    }
}
