//! End-to-end scenarios through the service bootstrap.
//!
//! Run with: `cargo test --test scenario_test`

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use registration_core::error::RegistrationError;
use registration_core::types::{Capacity, Event, EventId, RegistrationStatus, User, UserId};
use registration_service::{Config, RegistrationApp};
use registration_testing::{InMemoryEntityStore, SteppingClock};
use std::sync::Arc;

fn app() -> RegistrationApp {
    registration_testing::init_test_tracing();
    let app = RegistrationApp::with_parts(
        Config::default(),
        InMemoryEntityStore::new(),
        Arc::new(SteppingClock::default()),
    )
    .unwrap();
    for n in 0..4 {
        app.add_user(User::new(UserId::new(format!("u{n}")), format!("User {n}")));
    }
    app
}

fn user(n: usize) -> UserId {
    UserId::new(format!("u{n}"))
}

/// capacity=2 with waitlist, end to end.
#[tokio::test]
async fn test_waitlist_promotion_scenario() {
    let app = app();
    let event_id = EventId::new("e1");
    app.add_event(Event::new(event_id.clone(), "Meetup", Capacity::new(2).unwrap()).with_waitlist());
    let coordinator = app.coordinator();

    let statuses: Vec<_> = {
        let mut statuses = Vec::new();
        for n in 0..4 {
            let registration = coordinator.register(&event_id, &user(n)).await.unwrap();
            statuses.push((registration.status, registration.waitlist_position));
        }
        statuses
    };
    assert_eq!(
        statuses,
        vec![
            (RegistrationStatus::Registered, None),
            (RegistrationStatus::Registered, None),
            (RegistrationStatus::Waitlisted, Some(1)),
            (RegistrationStatus::Waitlisted, Some(2)),
        ]
    );

    let removed = coordinator.unregister(&event_id, &user(0)).await.unwrap();
    assert_eq!(removed.promoted, Some(user(2)));

    let summary = coordinator.status(&event_id).await.unwrap();
    assert_eq!(summary.registered_users, vec![user(1), user(2)]);
    assert_eq!(summary.waitlist_users, vec![user(3)]);

    let json = serde_json::to_value(&removed).unwrap();
    assert_eq!(json["previousStatus"], "registered");
    assert_eq!(json["promoted"], "u2");
}

/// capacity=1 without waitlist rejects the second user.
#[tokio::test]
async fn test_no_waitlist_scenario() {
    let app = app();
    let event_id = EventId::new("e1");
    app.add_event(Event::new(event_id.clone(), "Dinner", Capacity::MIN));

    app.coordinator().register(&event_id, &user(0)).await.unwrap();
    let err = app.coordinator().register(&event_id, &user(1)).await.unwrap_err();

    assert_eq!(err, RegistrationError::CapacityExceeded { event_id });
    assert!(app.render_metrics().is_none());
}

/// Registration JSON keeps the original field names.
#[tokio::test]
async fn test_registration_json_shape() {
    let app = app();
    let event_id = EventId::new("e1");
    app.add_event(Event::new(event_id.clone(), "Meetup", Capacity::MIN).with_waitlist());
    app.coordinator().register(&event_id, &user(0)).await.unwrap();

    let waitlisted = app.coordinator().register(&event_id, &user(1)).await.unwrap();
    let json = serde_json::to_value(&waitlisted).unwrap();

    assert_eq!(json["userId"], "u1");
    assert_eq!(json["eventId"], "e1");
    assert_eq!(json["status"], "waitlisted");
    assert_eq!(json["waitlistPosition"], 1);
}
