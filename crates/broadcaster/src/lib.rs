//! Live event fan-out for Troupe rooms.
//!
//! A [`LiveBroadcaster`] keeps, per room, a list of bounded subscriber
//! queues. Publishing never blocks: a subscriber whose queue is full misses
//! that event. Delivery to viewers that are not connected is not attempted.
//!
//! # Example
//!
//! ```
//! use broadcaster::{LiveBroadcaster, RoomEvent};
//!
//! # async fn example() -> Result<(), broadcaster::Error> {
//! let broadcaster = LiveBroadcaster::new();
//! let mut subscription = broadcaster.subscribe(1)?;
//!
//! broadcaster.publish(1, RoomEvent::MessageDeleted { message_id: 9 });
//! assert_eq!(
//!     subscription.recv().await,
//!     Some(RoomEvent::MessageDeleted { message_id: 9 })
//! );
//! # Ok(())
//! # }
//! ```

mod event;

pub use event::RoomEvent;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

/// Queue capacity per subscriber.
pub const SUBSCRIBER_CAPACITY: usize = 10;

/// Errors that can occur during broadcast operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The broadcaster has been shut down.
    #[error("broadcaster is shut down")]
    ShutDown,
}

/// Outcome of a single publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers that received the event.
    pub delivered: usize,
    /// Subscribers whose queue was full.
    pub dropped: usize,
}

struct Subscriber {
    id: u64,
    tx: mpsc::Sender<RoomEvent>,
}

#[derive(Default)]
struct Registry {
    rooms: RwLock<HashMap<i64, Vec<Subscriber>>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

/// Per-room registry of live subscribers.
///
/// Cloning is cheap; clones share the same registry.
#[derive(Clone, Default)]
pub struct LiveBroadcaster {
    registry: Arc<Registry>,
}

impl LiveBroadcaster {
    /// Create an empty broadcaster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber for a room.
    pub fn subscribe(&self, room_id: i64) -> Result<Subscription, Error> {
        let mut rooms = self
            .registry
            .rooms
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if self.registry.closed.load(Ordering::Acquire) {
            return Err(Error::ShutDown);
        }

        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);
        rooms.entry(room_id).or_default().push(Subscriber { id, tx });
        drop(rooms);

        debug!(room_id, subscriber_id = id, "Subscriber registered");

        Ok(Subscription {
            id,
            room_id,
            rx,
            registry: Arc::clone(&self.registry),
        })
    }

    /// Remove a subscriber. Unknown IDs are ignored.
    pub fn unsubscribe(&self, room_id: i64, subscriber_id: u64) {
        unsubscribe(&self.registry, room_id, subscriber_id);
    }

    /// Deliver an event to every current subscriber of a room.
    pub fn publish(&self, room_id: i64, event: RoomEvent) -> PublishReport {
        let rooms = self
            .registry
            .rooms
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let mut report = PublishReport::default();
        let Some(subscribers) = rooms.get(&room_id) else {
            return report;
        };

        for subscriber in subscribers {
            match subscriber.tx.try_send(event.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        room_id,
                        subscriber_id = subscriber.id,
                        event = event.kind(),
                        "Subscriber queue full, dropping event"
                    );
                    report.dropped += 1;
                }
                // Receiver gone; its Drop will unsubscribe.
                Err(TrySendError::Closed(_)) => {}
            }
        }

        report
    }

    /// Number of live subscribers for a room.
    pub fn subscriber_count(&self, room_id: i64) -> usize {
        self.registry
            .rooms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&room_id)
            .map_or(0, Vec::len)
    }

    /// Close every subscriber queue and refuse new subscriptions.
    pub fn shutdown(&self) {
        let mut rooms = self
            .registry
            .rooms
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.registry.closed.store(true, Ordering::Release);
        let count: usize = rooms.values().map(Vec::len).sum();
        rooms.clear();
        info!(subscribers = count, "Broadcaster shut down");
    }
}

fn unsubscribe(registry: &Registry, room_id: i64, subscriber_id: u64) {
    let mut rooms = registry.rooms.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(subscribers) = rooms.get_mut(&room_id) {
        subscribers.retain(|s| s.id != subscriber_id);
        if subscribers.is_empty() {
            rooms.remove(&room_id);
        }
        debug!(room_id, subscriber_id, "Subscriber removed");
    }
}

/// A live subscription to one room. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    room_id: i64,
    rx: mpsc::Receiver<RoomEvent>,
    registry: Arc<Registry>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn room_id(&self) -> i64 {
        self.room_id
    }

    /// Wait for the next event. Returns `None` once the broadcaster shuts down.
    pub async fn recv(&mut self) -> Option<RoomEvent> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        unsubscribe(&self.registry, self.room_id, self.id);
    }
}
