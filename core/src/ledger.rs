//! Registration ledger: the registration set of a single event.
//!
//! The ledger is a snapshot loaded from the [`EntityStore`] plus the derived
//! views the engines need (counts, waitlist order, tail position). Writes go
//! through the ledger so the snapshot stays in step with the store for the
//! rest of the operation.
//!
//! Waitlist order is derived on every read rather than stored: position
//! ascending, then `registered_at` ascending, then user id.

use crate::error::StoreError;
use crate::store::EntityStore;
use crate::types::{EventId, Registration, RegistrationSummary, UserId};
use std::cmp::Ordering;

/// Ordering of waitlisted registrations, next in line first.
#[must_use]
pub fn waitlist_order(a: &Registration, b: &Registration) -> Ordering {
    a.waitlist_position
        .unwrap_or(u32::MAX)
        .cmp(&b.waitlist_position.unwrap_or(u32::MAX))
        .then_with(|| a.registered_at.cmp(&b.registered_at))
        .then_with(|| a.user_id.cmp(&b.user_id))
}

fn admission_order(a: &Registration, b: &Registration) -> Ordering {
    a.registered_at
        .cmp(&b.registered_at)
        .then_with(|| a.user_id.cmp(&b.user_id))
}

/// Snapshot of one event's registrations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationLedger {
    event_id: EventId,
    registrations: Vec<Registration>,
}

impl RegistrationLedger {
    /// Build a ledger from already-loaded records. Records for other events are dropped.
    #[must_use]
    pub fn new(event_id: EventId, registrations: Vec<Registration>) -> Self {
        let registrations = registrations
            .into_iter()
            .filter(|r| r.event_id == event_id)
            .collect();
        Self {
            event_id,
            registrations,
        }
    }

    /// Load the registration set of `event_id` from the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the listing fails.
    pub async fn load<S>(store: &S, event_id: &EventId) -> Result<Self, StoreError>
    where
        S: EntityStore + ?Sized,
    {
        let registrations = store.list_registrations_for_event(event_id).await?;
        tracing::debug!(
            event_id = %event_id,
            count = registrations.len(),
            "Loaded registration ledger"
        );
        Ok(Self::new(event_id.clone(), registrations))
    }

    /// Persist `registration` and apply it to the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails; the snapshot is left unchanged.
    pub async fn record<S>(&mut self, store: &S, registration: Registration) -> Result<(), StoreError>
    where
        S: EntityStore + ?Sized,
    {
        store.put_registration(registration.clone()).await?;
        match self
            .registrations
            .iter_mut()
            .find(|r| r.user_id == registration.user_id)
        {
            Some(existing) => *existing = registration,
            None => self.registrations.push(registration),
        }
        Ok(())
    }

    /// Delete the registration of `user_id`, returning the removed record.
    ///
    /// Returns `Ok(None)` without touching the store when the user holds no
    /// registration in this snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the delete fails; the snapshot is left unchanged.
    pub async fn withdraw<S>(
        &mut self,
        store: &S,
        user_id: &UserId,
    ) -> Result<Option<Registration>, StoreError>
    where
        S: EntityStore + ?Sized,
    {
        let Some(index) = self.registrations.iter().position(|r| &r.user_id == user_id) else {
            return Ok(None);
        };
        store.delete_registration(&self.event_id, user_id).await?;
        Ok(Some(self.registrations.swap_remove(index)))
    }

    /// Event this ledger covers.
    #[must_use]
    pub const fn event_id(&self) -> &EventId {
        &self.event_id
    }

    /// Registration held by `user_id`, if any.
    #[must_use]
    pub fn get(&self, user_id: &UserId) -> Option<&Registration> {
        self.registrations.iter().find(|r| &r.user_id == user_id)
    }

    /// All records, unordered.
    #[must_use]
    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// No records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Number of registrations holding a slot.
    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.registrations.iter().filter(|r| r.is_registered()).count()
    }

    /// Number of waitlisted registrations.
    #[must_use]
    pub fn waitlist_count(&self) -> usize {
        self.registrations.iter().filter(|r| r.is_waitlisted()).count()
    }

    /// Registered records, earliest admission first.
    #[must_use]
    pub fn registered(&self) -> Vec<&Registration> {
        let mut registered: Vec<_> = self.registrations.iter().filter(|r| r.is_registered()).collect();
        registered.sort_by(|a, b| admission_order(a, b));
        registered
    }

    /// Waitlisted records, next in line first.
    #[must_use]
    pub fn waitlist(&self) -> Vec<&Registration> {
        let mut waitlist: Vec<_> = self.registrations.iter().filter(|r| r.is_waitlisted()).collect();
        waitlist.sort_by(|a, b| waitlist_order(a, b));
        waitlist
    }

    /// Highest waitlist position currently held, or 0 when nobody waits.
    #[must_use]
    pub fn tail_position(&self) -> u32 {
        self.registrations
            .iter()
            .filter_map(|r| r.waitlist_position)
            .max()
            .unwrap_or(0)
    }

    /// Counts and ordered user lists.
    #[must_use]
    pub fn summary(&self) -> RegistrationSummary {
        let registered_users: Vec<UserId> =
            self.registered().into_iter().map(|r| r.user_id.clone()).collect();
        let waitlist_users: Vec<UserId> =
            self.waitlist().into_iter().map(|r| r.user_id.clone()).collect();

        RegistrationSummary {
            event_id: self.event_id.clone(),
            registered_count: registered_users.len(),
            waitlist_count: waitlist_users.len(),
            registered_users,
            waitlist_users,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
            + Duration::seconds(seconds)
    }

    fn event() -> EventId {
        EventId::new("e1")
    }

    fn ledger() -> RegistrationLedger {
        RegistrationLedger::new(
            event(),
            vec![
                Registration::waitlisted(event(), UserId::new("w-late"), at(9), 3),
                Registration::registered(event(), UserId::new("r2"), at(2)),
                Registration::waitlisted(event(), UserId::new("w-first"), at(5), 1),
                Registration::registered(event(), UserId::new("r1"), at(1)),
                Registration::waitlisted(event(), UserId::new("w-second"), at(6), 2),
                Registration::registered(EventId::new("other"), UserId::new("x"), at(0)),
            ],
        )
    }

    #[test]
    fn test_foreign_records_are_dropped() {
        let ledger = ledger();
        assert_eq!(ledger.len(), 5);
        assert!(ledger.get(&UserId::new("x")).is_none());
    }

    #[test]
    fn test_counts_and_tail() {
        let ledger = ledger();
        assert_eq!(ledger.registered_count(), 2);
        assert_eq!(ledger.waitlist_count(), 3);
        assert_eq!(ledger.tail_position(), 3);
        assert_eq!(RegistrationLedger::new(event(), vec![]).tail_position(), 0);
    }

    #[test]
    fn test_summary_orders_users() {
        let summary = ledger().summary();

        assert_eq!(summary.registered_count, 2);
        assert_eq!(summary.waitlist_count, 3);
        assert_eq!(summary.registered_users, vec![UserId::new("r1"), UserId::new("r2")]);
        assert_eq!(
            summary.waitlist_users,
            vec![UserId::new("w-first"), UserId::new("w-second"), UserId::new("w-late")]
        );
    }

    #[test]
    fn test_waitlist_order_breaks_position_ties_by_time() {
        let early = Registration::waitlisted(event(), UserId::new("b"), at(1), 1);
        let late = Registration::waitlisted(event(), UserId::new("a"), at(2), 1);

        assert_eq!(waitlist_order(&early, &late), Ordering::Less);
        assert_eq!(waitlist_order(&late, &early), Ordering::Greater);
    }
}
