use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Errors that can occur while pushing an event to a single listener
///
/// These never leave the hub: a failed delivery only removes the listener.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Delivery timed out")]
    Timeout,

    #[error("Listener connection closed")]
    Closed,

    #[error("Send failed: {0}")]
    SendFailed(String),
}

/// Write side of a live connection
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Write one serialized event to the remote peer
    async fn deliver(&self, payload: &str) -> Result<(), DeliveryError>;

    /// Release the underlying transport
    async fn close(&self) -> Result<(), DeliveryError> {
        Ok(())
    }
}

/// Identity of a listener, unique per accepted connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered recipient of room events
///
/// Couples the connection's write handle with the cancellation token that
/// governs the connection. Cloning is cheap and every clone refers to the
/// same connection, so the hub can hold a copy while the connection task
/// keeps its own.
#[derive(Clone)]
pub struct Listener {
    id: ListenerId,
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
}

impl Listener {
    pub fn new(sink: Arc<dyn EventSink>, cancel: CancellationToken) -> Self {
        Self {
            id: ListenerId::new(),
            sink,
            cancel,
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Token observed by the owning connection task
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Signal the owning connection task to shut down. Idempotent.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Single write attempt bounded by `write_timeout`
    pub(crate) async fn deliver(
        &self,
        payload: &str,
        write_timeout: Duration,
    ) -> Result<(), DeliveryError> {
        if self.is_closed() {
            return Err(DeliveryError::Closed);
        }

        match tokio::time::timeout(write_timeout, self.sink.deliver(payload)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout),
        }
    }

    pub(crate) async fn close_transport(&self) -> Result<(), DeliveryError> {
        self.sink.close().await
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}
