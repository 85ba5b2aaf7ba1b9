//! In-memory retention of enriched events with recency-window queries.

use std::net::IpAddr;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};

use crate::models::Event;

/// Append-only store of enriched events, queryable by victim address and
/// recency window.
///
/// Created empty at process start and destroyed with the process; nothing is
/// persisted. Growth is unbounded unless the owner runs the retention
/// sweeper against [`EventStore::prune_older_than`].
///
/// Interior locking makes `append` and the queries safe under concurrent
/// multi-writer/multi-reader access; the lock is never held across an await
/// point.
pub struct EventStore {
    events: RwLock<Vec<Event>>,
}

impl EventStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        EventStore {
            events: RwLock::new(Vec::new()),
        }
    }

    /// Appends `event` to the end of the retained sequence and hands it back.
    ///
    /// Never fails; prior entries are untouched.
    pub fn append(&self, event: Event) -> Event {
        // A poisoned lock still guards structurally valid data; recover it
        // rather than fail an operation whose contract is infallible.
        let mut events = self.events.write().unwrap_or_else(|e| e.into_inner());
        events.push(event.clone());
        event
    }

    /// Events for `target` no older than `window_minutes`, in original
    /// insertion order.
    ///
    /// Window validation is the boundary's job; this component assumes a
    /// positive window.
    pub fn recent_for_target(&self, target: IpAddr, window_minutes: i64) -> Vec<Event> {
        self.recent_for_target_at(target, window_minutes, Utc::now())
    }

    /// Same as [`EventStore::recent_for_target`] with an explicit `now`, so
    /// callers (and tests) can pin the window boundary.
    ///
    /// The lower edge is inclusive: an event stamped exactly
    /// `now - window_minutes` is returned. The upper edge is open; `now`
    /// itself is always inside the window.
    pub fn recent_for_target_at(
        &self,
        target: IpAddr,
        window_minutes: i64,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        let cutoff = now - Duration::minutes(window_minutes);
        let events = self.events.read().unwrap_or_else(|e| e.into_inner());
        events
            .iter()
            .filter(|event| event.target_address == target && event.timestamp >= cutoff)
            .cloned()
            .collect()
    }

    /// Drops every event stamped before `cutoff`, preserving the insertion
    /// order of the remainder. Returns how many events were removed.
    pub fn prune_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let mut events = self.events.write().unwrap_or_else(|e| e.into_inner());
        let before = events.len();
        events.retain(|event| event.timestamp >= cutoff);
        before - events.len()
    }

    /// Number of retained events across all targets.
    pub fn len(&self) -> usize {
        self.events.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// True when nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}
