use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::socket::{SocketError, SocketReceiver};
use crate::event::{EventSink, Listener, ListenerId, RoomHub};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Active,
    Closed,
}

/// Why a connection left the Active state
#[derive(Debug)]
pub enum CloseReason {
    /// The client sent a close frame or the stream ended
    PeerClosed,
    /// Reading from the client failed
    ReceiveFailed(SocketError),
    /// The connection's token fired: server shutdown or a failed delivery
    Cancelled,
}

/// One subscriber's live connection to a room
///
/// Registers with the hub when run and stays registered until the peer
/// goes away or its cancellation token fires. The hub cancels the token
/// when a write to this connection fails; the token is also a child of the
/// server's shutdown token.
pub struct Connection {
    room_id: Uuid,
    listener: Listener,
    receiver: Box<dyn SocketReceiver>,
    hub: RoomHub,
    state: ConnectionState,
}

impl Connection {
    pub fn new(
        room_id: Uuid,
        sink: Arc<dyn EventSink>,
        receiver: Box<dyn SocketReceiver>,
        hub: RoomHub,
        governing: &CancellationToken,
    ) -> Self {
        Self {
            room_id,
            listener: Listener::new(sink, governing.child_token()),
            receiver,
            hub,
            state: ConnectionState::Connecting,
        }
    }

    pub fn listener_id(&self) -> ListenerId {
        self.listener.id()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    fn transition(&mut self, next: ConnectionState) {
        debug!(
            room_id = %self.room_id,
            listener_id = %self.listener.id(),
            from = ?self.state,
            to = ?next,
            "Connection state change"
        );
        self.state = next;
    }

    /// Run the connection until disconnect or cancellation
    ///
    /// Inbound frames are read only to notice the peer leaving; their
    /// content is ignored.
    pub async fn run(mut self) -> CloseReason {
        self.hub.register(self.room_id, self.listener.clone()).await;
        self.transition(ConnectionState::Active);

        let token = self.listener.cancellation().clone();
        let reason = loop {
            tokio::select! {
                _ = token.cancelled() => break CloseReason::Cancelled,

                msg = self.receiver.receive_message() => match msg {
                    Ok(Some(text)) => {
                        debug!(
                            room_id = %self.room_id,
                            listener_id = %self.listener.id(),
                            bytes = text.len(),
                            "Ignoring inbound message"
                        );
                    }
                    Ok(None) => break CloseReason::PeerClosed,
                    Err(e) => break CloseReason::ReceiveFailed(e),
                }
            }
        };

        // Cleanup: the hub may already have dropped us after a failed write
        self.listener.close();
        self.hub.unregister(self.room_id, self.listener.id()).await;
        // A peer that stopped reading never acknowledges the close frame
        match tokio::time::timeout(self.hub.write_timeout(), self.listener.close_transport()).await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(
                room_id = %self.room_id,
                listener_id = %self.listener.id(),
                error = %e,
                "Transport already gone while closing"
            ),
            Err(_) => debug!(
                room_id = %self.room_id,
                listener_id = %self.listener.id(),
                "Close handshake timed out, dropping transport"
            ),
        }
        self.transition(ConnectionState::Closed);

        match &reason {
            CloseReason::ReceiveFailed(e) => warn!(
                room_id = %self.room_id,
                listener_id = %self.listener.id(),
                error = %e,
                "Connection closed after receive error"
            ),
            _ => info!(
                room_id = %self.room_id,
                listener_id = %self.listener.id(),
                reason = ?reason,
                "Connection closed"
            ),
        }
        reason
    }
}
