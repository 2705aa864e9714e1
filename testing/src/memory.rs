//! In-memory entity store for fast, deterministic testing.

use registration_core::error::StoreError;
use registration_core::store::{EntityStore, StoreFuture};
use registration_core::types::{Event, EventId, Registration, User, UserId};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

#[derive(Debug, Default)]
struct Tables {
    events: HashMap<EventId, Event>,
    users: HashMap<UserId, User>,
    registrations: BTreeMap<(EventId, UserId), Registration>,
}

/// `HashMap`-backed [`EntityStore`].
///
/// Cloning shares the underlying tables. Every call yields to the scheduler
/// before touching the tables (and optionally sleeps for a simulated latency),
/// so concurrent operations really do interleave between their reads and
/// writes. That is what the coordinator's per-event serialization has to
/// withstand.
///
/// # Example
///
/// ```
/// use registration_testing::InMemoryEntityStore;
/// use registration_core::store::EntityStore;
/// use registration_core::types::UserId;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryEntityStore::new();
/// assert!(!store.user_exists(&UserId::new("u1")).await?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryEntityStore {
    tables: Arc<RwLock<Tables>>,
    latency: Option<Duration>,
}

impl InMemoryEntityStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `latency` inside every call.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Insert or replace an event.
    pub fn insert_event(&self, event: Event) {
        self.write().events.insert(event.id.clone(), event);
    }

    /// Insert or replace a user.
    pub fn insert_user(&self, user: User) {
        self.write().users.insert(user.id.clone(), user);
    }

    /// Remove an event. Its registrations stay behind.
    pub fn remove_event(&self, event_id: &EventId) -> Option<Event> {
        self.write().events.remove(event_id)
    }

    /// Number of stored users.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.read().users.len()
    }

    /// Snapshot of one event's registrations, ordered by user id.
    #[must_use]
    pub fn registrations_for(&self, event_id: &EventId) -> Vec<Registration> {
        self.read()
            .registrations
            .iter()
            .filter(|((event, _), _)| event == event_id)
            .map(|(_, registration)| registration.clone())
            .collect()
    }

    /// Total number of registration records.
    #[must_use]
    pub fn registration_count(&self) -> usize {
        self.read().registrations.len()
    }

    /// Clear all data (for test isolation)
    pub fn clear(&self) {
        let mut tables = self.write();
        tables.events.clear();
        tables.users.clear();
        tables.registrations.clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    async fn pause(&self) {
        match self.latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => tokio::task::yield_now().await,
        }
    }
}

impl EntityStore for InMemoryEntityStore {
    fn get_event<'a>(&'a self, event_id: &'a EventId) -> StoreFuture<'a, Option<Event>> {
        Box::pin(async move {
            self.pause().await;
            Ok(self.read().events.get(event_id).cloned())
        })
    }

    fn user_exists<'a>(&'a self, user_id: &'a UserId) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            self.pause().await;
            Ok(self.read().users.contains_key(user_id))
        })
    }

    fn get_registration<'a>(
        &'a self,
        event_id: &'a EventId,
        user_id: &'a UserId,
    ) -> StoreFuture<'a, Option<Registration>> {
        Box::pin(async move {
            self.pause().await;
            let key = (event_id.clone(), user_id.clone());
            Ok(self.read().registrations.get(&key).cloned())
        })
    }

    fn put_registration(&self, registration: Registration) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.pause().await;
            let key = (registration.event_id.clone(), registration.user_id.clone());
            self.write().registrations.insert(key, registration);
            Ok::<_, StoreError>(())
        })
    }

    fn delete_registration<'a>(
        &'a self,
        event_id: &'a EventId,
        user_id: &'a UserId,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.pause().await;
            let key = (event_id.clone(), user_id.clone());
            self.write().registrations.remove(&key);
            Ok(())
        })
    }

    fn list_registrations_for_event<'a>(
        &'a self,
        event_id: &'a EventId,
    ) -> StoreFuture<'a, Vec<Registration>> {
        Box::pin(async move {
            self.pause().await;
            Ok(self.registrations_for(event_id))
        })
    }

    fn list_registrations_for_user<'a>(
        &'a self,
        user_id: &'a UserId,
    ) -> StoreFuture<'a, Vec<Registration>> {
        Box::pin(async move {
            self.pause().await;
            Ok(self
                .read()
                .registrations
                .values()
                .filter(|registration| &registration.user_id == user_id)
                .cloned()
                .collect())
        })
    }
}
