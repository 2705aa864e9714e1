//! Entity store abstraction consumed by the registration ledger.
//!
//! The store is an external collaborator: durable key-value storage for
//! events, users and registrations. The engines never talk to it; the
//! [`RegistrationLedger`](crate::ledger::RegistrationLedger) and the
//! coordinator do.
//!
//! # Implementations
//!
//! - `InMemoryEntityStore` (in `registration-testing`): fast, deterministic tests
//! - `GuardedStore` (in `registration-runtime`): wraps another store with
//!   call timeouts and bounded retries of transient failures
//!
//! # Dyn Compatibility
//!
//! Methods return explicit `Pin<Box<dyn Future>>` instead of `async fn` so the
//! trait can be used as `Arc<dyn EntityStore>`.

use crate::error::StoreError;
use crate::types::{Event, EventId, Registration, UserId};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by every [`EntityStore`] method.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Key-value storage for events, users and registrations.
///
/// Registrations are keyed by `(event_id, user_id)`; at most one record exists
/// per pair. Implementations must be `Send + Sync`.
pub trait EntityStore: Send + Sync {
    /// Load an event.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store call fails.
    fn get_event<'a>(&'a self, event_id: &'a EventId) -> StoreFuture<'a, Option<Event>>;

    /// Check whether a user exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store call fails.
    fn user_exists<'a>(&'a self, user_id: &'a UserId) -> StoreFuture<'a, bool>;

    /// Load the registration for a pair.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store call fails.
    fn get_registration<'a>(
        &'a self,
        event_id: &'a EventId,
        user_id: &'a UserId,
    ) -> StoreFuture<'a, Option<Registration>>;

    /// Insert or replace a registration (unconditional upsert).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store call fails.
    fn put_registration(&self, registration: Registration) -> StoreFuture<'_, ()>;

    /// Delete the registration for a pair. Deleting a missing record is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store call fails.
    fn delete_registration<'a>(
        &'a self,
        event_id: &'a EventId,
        user_id: &'a UserId,
    ) -> StoreFuture<'a, ()>;

    /// All registrations for an event, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store call fails.
    fn list_registrations_for_event<'a>(
        &'a self,
        event_id: &'a EventId,
    ) -> StoreFuture<'a, Vec<Registration>>;

    /// All registrations held by a user across events, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store call fails.
    fn list_registrations_for_user<'a>(
        &'a self,
        user_id: &'a UserId,
    ) -> StoreFuture<'a, Vec<Registration>>;
}
