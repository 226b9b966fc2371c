use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{events::RoomEvent, hub::RoomHub};

/// How long a room worker waits for its next event before exiting
pub const DEFAULT_ROOM_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Handle used by request handlers to hand events off to the hub
///
/// `publish` never waits on delivery: the event is queued and the caller
/// continues. Events queued for one room are delivered in the order they
/// were queued.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: mpsc::UnboundedSender<(Uuid, RoomEvent)>,
}

impl EventPublisher {
    /// Queue an event for fan-out to the listeners of `room_id`
    pub fn publish(&self, room_id: Uuid, event: RoomEvent) {
        let kind = event.kind();
        if self.sender.send((room_id, event)).is_err() {
            warn!(room_id = %room_id, kind, "Event dispatcher has stopped, dropping event");
        } else {
            debug!(room_id = %room_id, kind, "Room event queued");
        }
    }
}

struct RoomWorker {
    sender: mpsc::UnboundedSender<RoomEvent>,
    handle: JoinHandle<()>,
}

/// Routes queued events to one worker task per room
///
/// Each room worker runs one publish at a time, so a listener that stays
/// registered sees its room's events in queue order. Rooms never wait on
/// each other. A worker exits after sitting idle and is started again on
/// the room's next event. The dispatcher stops once every
/// [`EventPublisher`] has been dropped and the room workers have drained.
pub struct EventDispatcher {
    hub: RoomHub,
    receiver: mpsc::UnboundedReceiver<(Uuid, RoomEvent)>,
    workers: HashMap<Uuid, RoomWorker>,
    idle_timeout: Duration,
}

impl EventDispatcher {
    pub fn new(hub: RoomHub) -> (Self, EventPublisher) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let dispatcher = Self {
            hub,
            receiver,
            workers: HashMap::new(),
            idle_timeout: DEFAULT_ROOM_IDLE_TIMEOUT,
        };
        (dispatcher, EventPublisher { sender })
    }

    /// Create a dispatcher for `hub` and start it on a background task
    pub fn spawn(hub: RoomHub) -> (EventPublisher, JoinHandle<()>) {
        let (dispatcher, publisher) = Self::new(hub);
        (publisher, dispatcher.start())
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        info!("Event dispatcher started");

        while let Some((room_id, event)) = self.receiver.recv().await {
            self.dispatch(room_id, event);
        }

        info!(rooms = self.workers.len(), "All publishers dropped, draining room workers");
        let handles: Vec<JoinHandle<()>> =
            self.workers.drain().map(|(_, worker)| worker.handle).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Room worker failed");
            }
        }
        info!("Event dispatcher stopped");
    }

    fn dispatch(&mut self, room_id: Uuid, event: RoomEvent) {
        self.workers
            .retain(|id, worker| *id == room_id || !worker.handle.is_finished());

        let event = match self.workers.get(&room_id) {
            Some(worker) => match worker.sender.send(event) {
                Ok(()) => return,
                // Worker went idle; its successor waits for it to drain
                Err(mpsc::error::SendError(event)) => event,
            },
            None => event,
        };

        let previous = self.workers.remove(&room_id).map(|worker| worker.handle);
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_room_worker(
            self.hub.clone(),
            room_id,
            event,
            receiver,
            previous,
            self.idle_timeout,
        ));
        debug!(room_id = %room_id, "Room worker started");
        self.workers.insert(room_id, RoomWorker { sender, handle });
    }
}

async fn run_room_worker(
    hub: RoomHub,
    room_id: Uuid,
    first: RoomEvent,
    mut receiver: mpsc::UnboundedReceiver<RoomEvent>,
    previous: Option<JoinHandle<()>>,
    idle_timeout: Duration,
) {
    if let Some(previous) = previous {
        let _ = previous.await;
    }

    hub.publish(room_id, &first).await;
    loop {
        match tokio::time::timeout(idle_timeout, receiver.recv()).await {
            Ok(Some(event)) => hub.publish(room_id, &event).await,
            Ok(None) => break,
            Err(_) => {
                // Refuse new events, then finish whatever was queued before the close
                receiver.close();
                while let Some(event) = receiver.recv().await {
                    hub.publish(room_id, &event).await;
                }
                debug!(room_id = %room_id, "Room worker idle, exiting");
                break;
            }
        }
    }
}
