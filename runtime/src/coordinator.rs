//! Registration coordinator.
//!
//! Orchestrates the admission and promotion engines against the store. Every
//! operation that reads an event's registration set runs under that event's
//! [`EventPermit`](crate::locks::EventPermit), so the read-decide-write cycle
//! of one operation never interleaves with another on the same event.
//!
//! ```text
//! register:   permit → event? → user? → ledger → [backfill] → admit → put
//! unregister: permit → ledger → delete → [event.has_waitlist] → backfill → put
//! status:     permit → event? → ledger → summary
//! ```

use crate::config::CoordinatorConfig;
use crate::guarded::GuardedStore;
use crate::locks::EventLocks;
use crate::metrics::CoordinatorMetrics;
use registration_core::admission::AdmissionEngine;
use registration_core::environment::Clock;
use registration_core::error::RegistrationError;
use registration_core::ledger::RegistrationLedger;
use registration_core::promotion::PromotionEngine;
use registration_core::store::EntityStore;
use registration_core::types::{
    Event, EventId, Registration, RegistrationSummary, Unregistration, UserId,
};
use std::sync::Arc;

/// Entry point for register, unregister and status queries.
///
/// Cloning is cheap and clones share the per-event lock registry, so every
/// clone serializes against the others.
///
/// # Example
///
/// ```rust
/// use registration_runtime::{CoordinatorConfig, RegistrationCoordinator};
/// use registration_core::environment::SystemClock;
/// use registration_core::types::{Capacity, Event, EventId, User, UserId};
/// use registration_testing::InMemoryEntityStore;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryEntityStore::new();
/// let capacity = Capacity::new(10).ok_or("capacity must be positive")?;
/// store.insert_event(Event::new(EventId::new("e1"), "Meetup", capacity));
/// store.insert_user(User::new(UserId::new("u1"), "Ada"));
///
/// let coordinator = RegistrationCoordinator::new(
///     Arc::new(store),
///     Arc::new(SystemClock),
///     &CoordinatorConfig::default(),
/// );
///
/// let registration = coordinator.register(&EventId::new("e1"), &UserId::new("u1")).await?;
/// assert!(registration.is_registered());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RegistrationCoordinator {
    store: GuardedStore,
    clock: Arc<dyn Clock>,
    locks: EventLocks,
    admission: AdmissionEngine,
    promotion: PromotionEngine,
}

impl std::fmt::Debug for RegistrationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationCoordinator")
            .field("store", &self.store)
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}

impl RegistrationCoordinator {
    /// Create a coordinator over `store`, guarding it per `config`.
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>, clock: Arc<dyn Clock>, config: &CoordinatorConfig) -> Self {
        Self {
            store: GuardedStore::new(store, config),
            clock,
            locks: EventLocks::new(),
            admission: AdmissionEngine::new(),
            promotion: PromotionEngine::new(),
        }
    }

    /// Per-event lock registry used by this coordinator.
    #[must_use]
    pub const fn locks(&self) -> &EventLocks {
        &self.locks
    }

    /// Register `user_id` for `event_id`.
    ///
    /// Returns the persisted record: registered while the event has room,
    /// otherwise waitlisted at the tail when the event keeps a waitlist.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::EntityNotFound`] if the event or user is missing
    /// - [`RegistrationError::AlreadyRegistered`] / [`RegistrationError::AlreadyWaitlisted`]
    /// - [`RegistrationError::CapacityExceeded`] if full without a waitlist
    /// - [`RegistrationError::Store`] if the store fails
    #[tracing::instrument(skip_all, fields(event_id = %event_id, user_id = %user_id))]
    pub async fn register(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<Registration, RegistrationError> {
        let result = self.register_locked(event_id, user_id).await;
        match &result {
            Ok(registration) => {
                CoordinatorMetrics::record_admission(registration.status);
                tracing::info!(
                    status = %registration.status,
                    position = registration.waitlist_position,
                    "Registration admitted"
                );
            }
            Err(error) => observe_failure(error),
        }
        result
    }

    async fn register_locked(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<Registration, RegistrationError> {
        let _permit = self.locks.acquire(event_id).await;

        let event = self
            .store
            .get_event(event_id)
            .await?
            .ok_or_else(|| RegistrationError::event_not_found(event_id))?;
        if !self.store.user_exists(user_id).await? {
            return Err(RegistrationError::user_not_found(user_id));
        }

        let mut ledger = RegistrationLedger::load(&self.store, event_id).await?;
        let repaired = self.backfill(&event, &mut ledger).await?;
        if !repaired.is_empty() {
            tracing::warn!(
                promoted = repaired.len(),
                "Filled slots left open by an earlier failed promotion"
            );
        }

        let registration = self
            .admission
            .admit(&event, user_id, &ledger, self.clock.now())?;
        ledger.record(&self.store, registration.clone()).await?;

        Ok(registration)
    }

    /// Remove the registration of `user_id` for `event_id`.
    ///
    /// When a registered user leaves an event that keeps a waitlist, the next
    /// entrant in line is promoted and persisted before the permit is released.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::NotRegistered`] if the user holds no registration
    /// - [`RegistrationError::Store`] if the store fails. A failure while
    ///   persisting the promotion is reported after the removal has already
    ///   been committed.
    #[tracing::instrument(skip_all, fields(event_id = %event_id, user_id = %user_id))]
    pub async fn unregister(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<Unregistration, RegistrationError> {
        let result = self.unregister_locked(event_id, user_id).await;
        match &result {
            Ok(unregistration) => {
                CoordinatorMetrics::record_unregistration(unregistration.previous_status);
                tracing::info!(
                    previous_status = %unregistration.previous_status,
                    promoted = unregistration.promoted.as_ref().map(UserId::as_str),
                    "Registration removed"
                );
            }
            Err(error) => observe_failure(error),
        }
        result
    }

    async fn unregister_locked(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<Unregistration, RegistrationError> {
        let _permit = self.locks.acquire(event_id).await;

        let mut ledger = RegistrationLedger::load(&self.store, event_id).await?;
        let removed = ledger
            .withdraw(&self.store, user_id)
            .await?
            .ok_or_else(|| RegistrationError::NotRegistered {
                event_id: event_id.clone(),
                user_id: user_id.clone(),
            })?;

        let promoted = if removed.is_registered() {
            match self.store.get_event(event_id).await? {
                Some(event) => self.backfill(&event, &mut ledger).await?.into_iter().next(),
                None => {
                    tracing::warn!("Event missing, skipping promotion");
                    None
                }
            }
        } else {
            None
        };

        Ok(Unregistration {
            event_id: event_id.clone(),
            user_id: user_id.clone(),
            previous_status: removed.status,
            promoted,
        })
    }

    /// Promote waitlisted entrants into every free slot, next in line first.
    ///
    /// After a removal this fills the freed slot. Before an admission it
    /// repairs a slot left open when an earlier promotion failed to persist,
    /// so a newcomer never takes a slot ahead of someone already waiting.
    async fn backfill(
        &self,
        event: &Event,
        ledger: &mut RegistrationLedger,
    ) -> Result<Vec<UserId>, RegistrationError> {
        let mut promoted_users = Vec::new();
        if !event.has_waitlist {
            return Ok(promoted_users);
        }

        while event.capacity.has_room_for(ledger.registered_count()) {
            let Some(promoted) = self.promotion.promote(ledger, self.clock.now()) else {
                break;
            };
            let promoted_user = promoted.user_id.clone();

            if let Err(error) = ledger.record(&self.store, promoted).await {
                tracing::error!(
                    event_id = %event.id,
                    user_id = %promoted_user,
                    error = %error,
                    "Failed to persist promotion"
                );
                return Err(error.into());
            }

            CoordinatorMetrics::record_promotion();
            tracing::info!(event_id = %event.id, user_id = %promoted_user, "Promoted from waitlist");
            promoted_users.push(promoted_user);
        }

        Ok(promoted_users)
    }

    /// Counts and ordered user lists for `event_id`.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::EntityNotFound`] if the event is missing
    /// - [`RegistrationError::Store`] if the store fails
    #[tracing::instrument(skip_all, fields(event_id = %event_id))]
    pub async fn status(&self, event_id: &EventId) -> Result<RegistrationSummary, RegistrationError> {
        let _permit = self.locks.acquire(event_id).await;

        if self.store.get_event(event_id).await?.is_none() {
            return Err(RegistrationError::event_not_found(event_id));
        }
        let ledger = RegistrationLedger::load(&self.store, event_id).await?;
        Ok(ledger.summary())
    }

    /// The registration of `user_id` for `event_id`.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::NotRegistered`] if there is none
    /// - [`RegistrationError::Store`] if the store fails
    pub async fn registration(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<Registration, RegistrationError> {
        self.store
            .get_registration(event_id, user_id)
            .await?
            .ok_or_else(|| RegistrationError::NotRegistered {
                event_id: event_id.clone(),
                user_id: user_id.clone(),
            })
    }

    /// Every registration `user_id` holds, earliest first.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::Store`] if the store fails.
    pub async fn registrations_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Registration>, RegistrationError> {
        let mut registrations = self.store.list_registrations_for_user(user_id).await?;
        registrations.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.event_id.cmp(&b.event_id))
        });
        Ok(registrations)
    }
}

fn observe_failure(error: &RegistrationError) {
    CoordinatorMetrics::record_rejection(error);
    if error.is_business_rule() {
        tracing::info!(reason = error.reason(), error = %error, "Operation rejected");
    } else {
        tracing::warn!(error = %error, "Operation failed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use registration_testing::fixtures::{seed_event, seed_users};
    use registration_testing::{InMemoryEntityStore, test_clock};

    fn coordinator(store: &InMemoryEntityStore) -> RegistrationCoordinator {
        RegistrationCoordinator::new(
            Arc::new(store.clone()),
            Arc::new(test_clock()),
            &CoordinatorConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_register_then_status() {
        let store = InMemoryEntityStore::new();
        seed_event(&store, "e1", 2, true);
        seed_users(&store, &["u1"]);
        let coordinator = coordinator(&store);

        let registration = coordinator
            .register(&EventId::new("e1"), &UserId::new("u1"))
            .await
            .unwrap();
        let summary = coordinator.status(&EventId::new("e1")).await.unwrap();

        assert!(registration.is_registered());
        assert_eq!(summary.registered_users, vec![UserId::new("u1")]);
        assert_eq!(coordinator.locks().active(), 0);
    }

    #[tokio::test]
    async fn test_unknown_event_is_reported_first() {
        let store = InMemoryEntityStore::new();
        let coordinator = coordinator(&store);

        let err = coordinator
            .register(&EventId::new("missing"), &UserId::new("nobody"))
            .await
            .unwrap_err();

        assert_eq!(err, RegistrationError::event_not_found(&EventId::new("missing")));
    }
}
