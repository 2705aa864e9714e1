//! Per-event mutual exclusion.
//!
//! Admission is check-then-act: read the registration set, decide, write.
//! Two registrations for the same event must never interleave between the
//! read and the write, or both can observe a free slot. [`EventLocks`] hands
//! out one [`EventPermit`] per event id at a time; permits for different
//! events never contend.
//!
//! Entries are created on first use and pruned when the last permit holder
//! (or waiter) for an event goes away, so the registry only holds events with
//! operations in flight. Waiters are served in FIFO order.

use registration_core::types::EventId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Registry = Arc<Mutex<HashMap<EventId, Arc<AsyncMutex<()>>>>>;

/// Registry of per-event async mutexes.
///
/// Cloning shares the registry.
#[derive(Clone, Debug, Default)]
pub struct EventLocks {
    registry: Registry,
}

/// Exclusive access to one event's registration set. Released on drop.
#[derive(Debug)]
pub struct EventPermit {
    event_id: EventId,
    guard: Option<OwnedMutexGuard<()>>,
    registry: Registry,
}

impl EventLocks {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `event_id`.
    pub async fn acquire(&self, event_id: &EventId) -> EventPermit {
        let lock = self.entry(event_id);
        let started = Instant::now();
        let guard = lock.lock_owned().await;
        let waited = started.elapsed();

        crate::metrics::CoordinatorMetrics::record_lock_wait(waited);
        tracing::debug!(
            event_id = %event_id,
            waited_us = waited.as_micros(),
            "Acquired event permit"
        );

        self.permit(event_id, guard)
    }

    /// Take the permit only if nobody holds it.
    #[must_use]
    pub fn try_acquire(&self, event_id: &EventId) -> Option<EventPermit> {
        self.entry(event_id)
            .try_lock_owned()
            .ok()
            .map(|guard| self.permit(event_id, guard))
    }

    /// Number of events with a permit held or awaited.
    #[must_use]
    pub fn active(&self) -> usize {
        lock_registry(&self.registry).len()
    }

    fn entry(&self, event_id: &EventId) -> Arc<AsyncMutex<()>> {
        let mut registry = lock_registry(&self.registry);
        Arc::clone(registry.entry(event_id.clone()).or_default())
    }

    fn permit(&self, event_id: &EventId, guard: OwnedMutexGuard<()>) -> EventPermit {
        EventPermit {
            event_id: event_id.clone(),
            guard: Some(guard),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl EventPermit {
    /// Event this permit covers.
    #[must_use]
    pub const fn event_id(&self) -> &EventId {
        &self.event_id
    }
}

impl Drop for EventPermit {
    fn drop(&mut self) {
        // Release first so the registry's reference is the only one left.
        drop(self.guard.take());
        drop(prune_entry(&self.registry, &self.event_id));
    }
}

fn lock_registry(registry: &Registry) -> MutexGuard<'_, HashMap<EventId, Arc<AsyncMutex<()>>>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Remove the entry for `event_id` when nobody else references it.
fn prune_entry(registry: &Registry, event_id: &EventId) -> Option<Arc<AsyncMutex<()>>> {
    let mut registry = lock_registry(registry);
    let unused = registry
        .get(event_id)
        .is_some_and(|lock| Arc::strong_count(lock) == 1);
    if unused { registry.remove(event_id) } else { None }
}
