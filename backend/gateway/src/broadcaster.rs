//! Synchronization Broadcaster
//!
//! Registry of connected subscribers, each fed through its own bounded
//! channel. Publishing never waits: a closed channel removes that subscriber,
//! a full one drops droppable deltas and tears the subscriber down otherwise.
//! The registry itself is not locked; it lives inside the presentation hub's
//! mutex.

use indexmap::IndexMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::state::Cursor;
use crate::ws_protocol::{Role, ServerMessage};

pub type SubscriberId = Uuid;

#[derive(Debug)]
pub struct Subscriber {
    pub id: SubscriberId,
    pub role: Role,
    tx: mpsc::Sender<ServerMessage>,
    /// Slide of the last navigation payload delivered.
    pub last_slide: usize,
    /// Local cursor for viewer-side stepping.
    pub cursor: Cursor,
}

/// Why a subscriber left the registry during a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    Closed,
    Lagging,
}

impl RemovalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalReason::Closed => "closed",
            RemovalReason::Lagging => "lagging",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub dropped: usize,
    pub removed: Vec<(SubscriberId, Role, RemovalReason)>,
}

enum Delivery {
    Delivered,
    Dropped,
    Gone(RemovalReason),
}

fn deliver(sub: &Subscriber, msg: ServerMessage) -> Delivery {
    match sub.tx.try_send(msg) {
        Ok(()) => Delivery::Delivered,
        Err(TrySendError::Full(msg)) if msg.is_droppable() => {
            debug!(subscriber = %sub.id, kind = msg.kind(), "Subscriber buffer full; dropping delta");
            Delivery::Dropped
        }
        Err(TrySendError::Full(msg)) => {
            warn!(subscriber = %sub.id, kind = msg.kind(), "Subscriber buffer full; disconnecting");
            Delivery::Gone(RemovalReason::Lagging)
        }
        Err(TrySendError::Closed(_)) => Delivery::Gone(RemovalReason::Closed),
    }
}

#[derive(Debug)]
pub struct Broadcaster {
    subscribers: IndexMap<SubscriberId, Subscriber>,
    buffer: usize,
}

impl Broadcaster {
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: IndexMap::new(),
            buffer: buffer.max(1),
        }
    }

    pub fn register(&mut self, role: Role, cursor: Cursor) -> (SubscriberId, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = Uuid::new_v4();
        self.subscribers.insert(
            id,
            Subscriber {
                id,
                role,
                tx,
                last_slide: cursor.position().slide,
                cursor,
            },
        );
        (id, rx)
    }

    pub fn remove(&mut self, id: &SubscriberId) -> Option<Subscriber> {
        self.subscribers.shift_remove(id)
    }

    pub fn get(&self, id: &SubscriberId) -> Option<&Subscriber> {
        self.subscribers.get(id)
    }

    pub fn get_mut(&mut self, id: &SubscriberId) -> Option<&mut Subscriber> {
        self.subscribers.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn count(&self, role: Role) -> usize {
        self.subscribers.values().filter(|s| s.role == role).count()
    }

    /// Send the same delta to everyone.
    pub fn publish(&mut self, msg: &ServerMessage) -> PublishReport {
        self.publish_with(|_| Some(msg.clone()))
    }

    /// Fan out a per-subscriber delta. `build` may update the subscriber's
    /// bookkeeping and returns `None` to skip it.
    pub fn publish_with(&mut self, mut build: impl FnMut(&mut Subscriber) -> Option<ServerMessage>) -> PublishReport {
        let mut report = PublishReport::default();
        for sub in self.subscribers.values_mut() {
            let Some(msg) = build(sub) else { continue };
            match deliver(sub, msg) {
                Delivery::Delivered => report.delivered += 1,
                Delivery::Dropped => report.dropped += 1,
                Delivery::Gone(reason) => report.removed.push((sub.id, sub.role, reason)),
            }
        }
        for (id, _, _) in &report.removed {
            self.subscribers.shift_remove(id);
        }
        report
    }

    /// Deliver to a single subscriber. Returns the removal reason if the
    /// subscriber had to be dropped.
    pub fn send_to(&mut self, id: &SubscriberId, msg: ServerMessage) -> Option<RemovalReason> {
        let sub = self.subscribers.get(id)?;
        match deliver(sub, msg) {
            Delivery::Gone(reason) => {
                self.subscribers.shift_remove(id);
                Some(reason)
            }
            _ => None,
        }
    }
}
