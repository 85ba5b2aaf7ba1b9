//! Per-victim-address registry of live subscribers.

use std::collections::HashMap;
use std::net::IpAddr;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::Event;

/// Opaque handle to one connected watcher.
///
/// The registry knows nothing about the transport behind a handle: delivery
/// either queues or the handle reports itself dead, and removal of a dead
/// handle belongs to its connection-lifecycle owner.
#[derive(Debug, Clone)]
pub struct Subscriber {
    id: Uuid,
    sender: UnboundedSender<Event>,
}

impl Subscriber {
    fn new(sender: UnboundedSender<Event>) -> Self {
        Subscriber {
            id: Uuid::new_v4(),
            sender,
        }
    }

    /// Unique id of this handle.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Queues `event` for this subscriber.
    ///
    /// Returns false when the receiving side is gone. The unbounded FIFO
    /// channel preserves the order of successive deliveries.
    pub fn deliver(&self, event: &Event) -> bool {
        self.sender.send(event.clone()).is_ok()
    }

    /// True while the receiving side still exists.
    pub fn is_live(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Outcome of one broadcast: how many deliveries were queued and how many
/// handles turned out dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Deliveries queued successfully.
    pub delivered: usize,
    /// Handles whose receiving side was already gone.
    pub failed: usize,
}

/// Tracks live subscriber channels keyed by victim address.
///
/// Connect, disconnect, and broadcast may be invoked concurrently from
/// independent tasks; each call observes a consistent snapshot of the
/// subscriber list. An address entry is pruned the moment its last handle
/// leaves, so the map never accumulates empty entries.
pub struct SubscriptionRegistry {
    subscribers: RwLock<HashMap<IpAddr, Vec<Subscriber>>>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        SubscriptionRegistry {
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a new subscriber for `target` and returns its handle id
    /// together with the receiving end of its event channel.
    ///
    /// Transmits nothing itself: replaying history is the caller's job, done
    /// after registration so a concurrently ingested event is never missed.
    pub async fn connect(&self, target: IpAddr) -> (Uuid, UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscriber = Subscriber::new(tx);
        let id = subscriber.id();

        let mut subscribers = self.subscribers.write().await;
        subscribers.entry(target).or_default().push(subscriber);
        log::debug!("subscriber {} connected for {}", id, target);

        (id, rx)
    }

    /// Removes the subscriber `id` from `target`.
    ///
    /// Idempotent: removing an absent id, or from an address with no entry,
    /// is a no-op.
    pub async fn disconnect(&self, target: IpAddr, id: Uuid) {
        let mut subscribers = self.subscribers.write().await;
        if let Some(handles) = subscribers.get_mut(&target) {
            let before = handles.len();
            handles.retain(|subscriber| subscriber.id() != id);
            if handles.len() < before {
                log::debug!("subscriber {} disconnected from {}", id, target);
            }
            if handles.is_empty() {
                subscribers.remove(&target);
            }
        }
    }

    /// Delivers `event` to every subscriber currently registered for
    /// `target`.
    ///
    /// A dead handle is skipped and counted; it never aborts delivery to the
    /// remaining subscribers and never surfaces to the caller. The handle
    /// itself stays registered until its connection owner disconnects it.
    pub async fn broadcast(&self, target: IpAddr, event: &Event) -> BroadcastOutcome {
        let subscribers = self.subscribers.read().await;
        let mut outcome = BroadcastOutcome {
            delivered: 0,
            failed: 0,
        };

        let Some(handles) = subscribers.get(&target) else {
            return outcome;
        };

        for subscriber in handles {
            if subscriber.deliver(event) {
                outcome.delivered += 1;
            } else {
                outcome.failed += 1;
                log::debug!(
                    "dropping delivery to dead subscriber {} on {}",
                    subscriber.id(),
                    target
                );
            }
        }

        outcome
    }

    /// Number of live handles across all addresses.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .await
            .values()
            .map(|handles| handles.len())
            .sum()
    }

    /// Number of victim addresses with at least one subscriber.
    pub async fn watched_address_count(&self) -> usize {
        self.subscribers.read().await.len()
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
