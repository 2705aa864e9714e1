//! Fault-injecting store wrapper.

use registration_core::error::StoreError;
use registration_core::store::{EntityStore, StoreFuture};
use registration_core::types::{Event, EventId, Registration, UserId};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Kind of failure a [`FaultyStore`] injects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InjectedFault {
    /// [`StoreError::Transient`]
    Transient,
    /// [`StoreError::Unavailable`]
    Unavailable,
}

impl InjectedFault {
    fn error(self, operation: &str) -> StoreError {
        match self {
            Self::Transient => StoreError::Transient(format!("injected failure in {operation}")),
            Self::Unavailable => StoreError::Unavailable(format!("injected outage in {operation}")),
        }
    }
}

/// Wraps another [`EntityStore`] and fails calls on demand.
///
/// # Example
///
/// ```
/// use registration_testing::{FaultyStore, InMemoryEntityStore, InjectedFault};
/// use registration_core::store::EntityStore;
/// use registration_core::types::UserId;
///
/// # async fn example() {
/// let store = FaultyStore::new(InMemoryEntityStore::new());
/// store.fail_next(1, InjectedFault::Transient);
///
/// assert!(store.user_exists(&UserId::new("u1")).await.is_err());
/// assert!(store.user_exists(&UserId::new("u1")).await.is_ok());
/// assert_eq!(store.calls(), 2);
/// # }
/// ```
#[derive(Debug)]
pub struct FaultyStore<S> {
    inner: S,
    calls: AtomicUsize,
    unavailable: AtomicBool,
    pending_failures: AtomicUsize,
    transient: AtomicBool,
    pending_put_failures: AtomicUsize,
}

impl<S: EntityStore> FaultyStore<S> {
    /// Wrap `inner`; no faults until configured.
    #[must_use]
    pub const fn new(inner: S) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
            pending_failures: AtomicUsize::new(0),
            transient: AtomicBool::new(true),
            pending_put_failures: AtomicUsize::new(0),
        }
    }

    /// The wrapped store.
    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// Fail every call with [`StoreError::Unavailable`] until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Fail the next `count` calls of any kind.
    pub fn fail_next(&self, count: usize, fault: InjectedFault) {
        self.transient
            .store(fault == InjectedFault::Transient, Ordering::SeqCst);
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// Fail the next `count` `put_registration` calls with [`StoreError::Unavailable`].
    pub fn fail_next_puts(&self, count: usize) {
        self.pending_put_failures.store(count, Ordering::SeqCst);
    }

    /// Number of calls received, failed ones included.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, operation: &str) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            tracing::debug!(operation, "Injecting outage");
            return Err(InjectedFault::Unavailable.error(operation));
        }
        if take_one(&self.pending_failures) {
            let fault = if self.transient.load(Ordering::SeqCst) {
                InjectedFault::Transient
            } else {
                InjectedFault::Unavailable
            };
            tracing::debug!(operation, ?fault, "Injecting store fault");
            return Err(fault.error(operation));
        }
        Ok(())
    }
}

/// Decrement `counter` if positive; true when a unit was taken.
fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

impl<S: EntityStore> EntityStore for FaultyStore<S> {
    fn get_event<'a>(&'a self, event_id: &'a EventId) -> StoreFuture<'a, Option<Event>> {
        Box::pin(async move {
            self.check("get_event")?;
            self.inner.get_event(event_id).await
        })
    }

    fn user_exists<'a>(&'a self, user_id: &'a UserId) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            self.check("user_exists")?;
            self.inner.user_exists(user_id).await
        })
    }

    fn get_registration<'a>(
        &'a self,
        event_id: &'a EventId,
        user_id: &'a UserId,
    ) -> StoreFuture<'a, Option<Registration>> {
        Box::pin(async move {
            self.check("get_registration")?;
            self.inner.get_registration(event_id, user_id).await
        })
    }

    fn put_registration(&self, registration: Registration) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.check("put_registration")?;
            if take_one(&self.pending_put_failures) {
                return Err(InjectedFault::Unavailable.error("put_registration"));
            }
            self.inner.put_registration(registration).await
        })
    }

    fn delete_registration<'a>(
        &'a self,
        event_id: &'a EventId,
        user_id: &'a UserId,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.check("delete_registration")?;
            self.inner.delete_registration(event_id, user_id).await
        })
    }

    fn list_registrations_for_event<'a>(
        &'a self,
        event_id: &'a EventId,
    ) -> StoreFuture<'a, Vec<Registration>> {
        Box::pin(async move {
            self.check("list_registrations_for_event")?;
            self.inner.list_registrations_for_event(event_id).await
        })
    }

    fn list_registrations_for_user<'a>(
        &'a self,
        user_id: &'a UserId,
    ) -> StoreFuture<'a, Vec<Registration>> {
        Box::pin(async move {
            self.check("list_registrations_for_user")?;
            self.inner.list_registrations_for_user(user_id).await
        })
    }
}
