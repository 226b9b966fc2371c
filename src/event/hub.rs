use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::events::RoomEvent;
use super::listener::{Listener, ListenerId};

/// Upper bound on a single write to one listener
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

type Registry = HashMap<Uuid, HashMap<ListenerId, Listener>>;

/// Tracks which live connections listen to which room and fans events out to them
///
/// The registry lock is held only while mutating or snapshotting the map,
/// never across a write to a remote peer. Rooms whose listener set becomes
/// empty are dropped from the map.
#[derive(Debug, Clone)]
pub struct RoomHub {
    /// room_id -> listeners currently connected to that room
    rooms: Arc<RwLock<Registry>>,
    write_timeout: Duration,
}

impl Default for RoomHub {
    fn default() -> Self {
        Self::new(DEFAULT_WRITE_TIMEOUT)
    }
}

impl RoomHub {
    pub fn new(write_timeout: Duration) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            write_timeout,
        }
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    /// Adds a listener to a room, creating the room's set on first use
    pub async fn register(&self, room_id: Uuid, listener: Listener) {
        let listener_id = listener.id();
        let mut rooms = self.rooms.write().await;
        let listeners = rooms.entry(room_id).or_default();
        listeners.insert(listener_id, listener);

        info!(
            room_id = %room_id,
            listener_id = %listener_id,
            listeners = listeners.len(),
            "Listener registered"
        );
    }

    /// Removes a listener from a room. Returns false if it was already gone.
    pub async fn unregister(&self, room_id: Uuid, listener_id: ListenerId) -> bool {
        let removed = self.remove_listeners(room_id, &[listener_id]).await;
        if removed > 0 {
            info!(room_id = %room_id, listener_id = %listener_id, "Listener unregistered");
        } else {
            debug!(room_id = %room_id, listener_id = %listener_id, "Listener already unregistered");
        }
        removed > 0
    }

    /// Delivers an event to every listener currently registered for the room
    ///
    /// Deliveries run concurrently against a snapshot of the room's set. A
    /// listener whose write fails or exceeds the write timeout is closed and
    /// unregistered before this returns. Nothing is queued for rooms with no
    /// listeners.
    pub async fn publish(&self, room_id: Uuid, event: &RoomEvent) {
        let snapshot: Vec<Listener> = {
            let rooms = self.rooms.read().await;
            match rooms.get(&room_id) {
                Some(listeners) if !listeners.is_empty() => listeners.values().cloned().collect(),
                _ => {
                    debug!(room_id = %room_id, kind = event.kind(), "No listeners for room event");
                    return;
                }
            }
        };

        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                error!(room_id = %room_id, kind = event.kind(), error = %e, "Failed to serialize room event");
                return;
            }
        };

        let payload = payload.as_str();
        let write_timeout = self.write_timeout;
        let results = join_all(snapshot.iter().map(|listener| async move {
            let result = listener.deliver(payload, write_timeout).await;
            (listener, result)
        }))
        .await;

        let mut failed = Vec::new();
        for (listener, result) in results {
            if let Err(e) = result {
                warn!(
                    room_id = %room_id,
                    listener_id = %listener.id(),
                    kind = event.kind(),
                    error = %e,
                    "Failed to deliver room event, dropping listener"
                );
                listener.close();
                failed.push(listener.id());
            }
        }

        if !failed.is_empty() {
            self.remove_listeners(room_id, &failed).await;
        }

        debug!(
            room_id = %room_id,
            kind = event.kind(),
            delivered = snapshot.len() - failed.len(),
            dropped = failed.len(),
            "Room event published"
        );
    }

    /// Number of listeners currently registered for a room
    pub async fn listener_count(&self, room_id: Uuid) -> usize {
        self.rooms
            .read()
            .await
            .get(&room_id)
            .map_or(0, |listeners| listeners.len())
    }

    /// Number of rooms with at least one listener
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    async fn remove_listeners(&self, room_id: Uuid, listener_ids: &[ListenerId]) -> usize {
        let mut rooms = self.rooms.write().await;
        let Some(listeners) = rooms.get_mut(&room_id) else {
            return 0;
        };

        let removed = listener_ids
            .iter()
            .filter(|id| listeners.remove(id).is_some())
            .count();

        if listeners.is_empty() {
            rooms.remove(&room_id);
        }
        removed
    }
}
