//! Property tests for the admission and promotion engines.
//!
//! Drives the engines through random register/unregister sequences against a
//! plain in-process ledger and checks the registration invariants after every
//! step.
//!
//! Run with: `cargo test -p registration-core --test engine_properties`

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use registration_core::{
    AdmissionEngine, Capacity, Event, EventId, PromotionEngine, Registration, RegistrationError,
    RegistrationLedger, UserId,
};
use std::collections::HashSet;

#[derive(Clone, Debug)]
enum Op {
    Register(u8),
    Unregister(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u8..12).prop_map(Op::Register),
        2 => (0u8..12).prop_map(Op::Unregister),
    ]
}

fn at(tick: i64) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
        + Duration::milliseconds(tick)
}

struct Model {
    event: Event,
    records: Vec<Registration>,
    tick: i64,
}

impl Model {
    fn ledger(&self) -> RegistrationLedger {
        RegistrationLedger::new(self.event.id.clone(), self.records.clone())
    }

    fn now(&mut self) -> DateTime<Utc> {
        self.tick += 1;
        at(self.tick)
    }

    fn register(&mut self, user: &UserId) -> Result<Registration, RegistrationError> {
        let now = self.now();
        let registration = AdmissionEngine::new().admit(&self.event, user, &self.ledger(), now)?;
        self.records.push(registration.clone());
        Ok(registration)
    }

    /// Returns (removed, promoted).
    fn unregister(&mut self, user: &UserId) -> Option<(Registration, Option<Registration>)> {
        let index = self.records.iter().position(|r| &r.user_id == user)?;
        let removed = self.records.remove(index);
        let mut promoted = None;
        if removed.is_registered() && self.event.has_waitlist {
            let now = self.now();
            if let Some(next) = PromotionEngine::new().promote(&self.ledger(), now) {
                let slot = self.records.iter_mut().find(|r| r.user_id == next.user_id).unwrap();
                *slot = next.clone();
                promoted = Some(next);
            }
        }
        Some((removed, promoted))
    }
}

fn assert_invariants(model: &Model) {
    let ledger = model.ledger();
    let capacity = usize::try_from(model.event.capacity.value()).unwrap();
    assert!(ledger.registered_count() <= capacity, "capacity exceeded");

    let users: HashSet<_> = model.records.iter().map(|r| r.user_id.clone()).collect();
    assert_eq!(users.len(), model.records.len(), "duplicate registration");

    for record in &model.records {
        assert_eq!(record.is_registered(), record.waitlist_position.is_none());
    }

    // Positions unique and increasing with arrival.
    let waitlist = ledger.waitlist();
    for pair in waitlist.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        assert!(a.waitlist_position < b.waitlist_position, "positions not unique");
        assert!(a.registered_at < b.registered_at, "later arrival ranked ahead");
    }

    // Nobody waits while a slot is free.
    if !waitlist.is_empty() {
        assert_eq!(ledger.registered_count(), capacity);
    }
}

proptest! {
    #[test]
    fn prop_invariants_hold_with_waitlist(
        capacity in 1u32..5,
        ops in prop::collection::vec(op_strategy(), 1..80),
    ) {
        let event = Event::new(EventId::new("e1"), "Prop", Capacity::new(capacity).unwrap()).with_waitlist();
        let mut model = Model { event, records: Vec::new(), tick: 0 };

        for op in ops {
            match op {
                Op::Register(n) => {
                    let user = UserId::new(format!("u{n}"));
                    let existed = model.records.iter().any(|r| r.user_id == user);
                    let result = model.register(&user);
                    prop_assert_eq!(result.is_err(), existed);
                }
                Op::Unregister(n) => {
                    let user = UserId::new(format!("u{n}"));
                    let before: Vec<_> = model.records.clone();
                    if let Some((removed, promoted)) = model.unregister(&user) {
                        if removed.is_waitlisted() {
                            // Nobody else moves.
                            prop_assert!(promoted.is_none());
                            let after: Vec<_> = before.into_iter().filter(|r| r.user_id != user).collect();
                            prop_assert_eq!(&after, &model.records);
                        } else {
                            // Earliest waiter by position, then arrival, then id.
                            let expected = before
                                .iter()
                                .filter(|r| r.is_waitlisted())
                                .min_by(|a, b| {
                                    (a.waitlist_position, a.registered_at, &a.user_id)
                                        .cmp(&(b.waitlist_position, b.registered_at, &b.user_id))
                                })
                                .map(|r| r.user_id.clone());
                            let promoted_user = promoted.map(|p| p.user_id);
                            prop_assert_eq!(promoted_user, expected);
                        }
                    }
                }
            }
            assert_invariants(&model);
        }
    }

    #[test]
    fn prop_without_waitlist_never_waitlists(
        capacity in 1u32..4,
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let event = Event::new(EventId::new("e1"), "Prop", Capacity::new(capacity).unwrap());
        let mut model = Model { event, records: Vec::new(), tick: 0 };

        for op in ops {
            match op {
                Op::Register(n) => {
                    let user = UserId::new(format!("u{n}"));
                    let full = model.ledger().registered_count() == usize::try_from(capacity).unwrap();
                    let existed = model.records.iter().any(|r| r.user_id == user);
                    match model.register(&user) {
                        Ok(registration) => prop_assert!(registration.is_registered()),
                        Err(RegistrationError::CapacityExceeded { .. }) => prop_assert!(full && !existed),
                        Err(err) => prop_assert!(err.is_duplicate()),
                    }
                }
                Op::Unregister(n) => {
                    let _ = model.unregister(&UserId::new(format!("u{n}")));
                }
            }
            prop_assert_eq!(model.ledger().waitlist_count(), 0);
            assert_invariants(&model);
        }
    }
}
