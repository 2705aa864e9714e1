//! Registration Demo
//!
//! Walks through the registration lifecycle against the in-memory store:
//! - Filling an event and overflowing into the waitlist
//! - Promotion when a registered attendee leaves
//! - Rejection when an event without waitlist is full
//! - A burst of concurrent registrations that never overbooks
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin demo
//!
//! # With the Prometheus exporter
//! METRICS_ENABLED=true cargo run --bin demo
//! ```

use futures::future::join_all;
use registration_core::types::{Capacity, Event, EventId, User, UserId};
use registration_service::{Config, RegistrationApp};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},registration=debug", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("\n============================================");
    println!("   Event Registration - Live Demo");
    println!("============================================\n");

    let app = RegistrationApp::new(config)?;
    let coordinator = app.coordinator();

    for (id, name) in [("u0", "Ada"), ("u1", "Grace"), ("u2", "Edsger"), ("u3", "Barbara")] {
        app.add_user(User::new(UserId::new(id), name));
    }

    // ========== Scenario 1: Waitlist ==========

    println!("Scenario 1: Workshop with 2 seats and a waitlist\n");
    let workshop = EventId::new("workshop");
    let two = Capacity::new(2).ok_or("capacity must be positive")?;
    app.add_event(Event::new(workshop.clone(), "Rust Workshop", two).with_waitlist());

    for id in ["u0", "u1", "u2", "u3"] {
        let registration = coordinator.register(&workshop, &UserId::new(id)).await?;
        match registration.waitlist_position {
            Some(position) => println!("   {id}: waitlisted at position {position}"),
            None => println!("   {id}: registered"),
        }
    }

    let summary = coordinator.status(&workshop).await?;
    println!("\n   Status: {}", serde_json::to_string_pretty(&summary)?);

    println!("\n   u0 leaves...");
    let removed = coordinator.unregister(&workshop, &UserId::new("u0")).await?;
    if let Some(promoted) = &removed.promoted {
        println!("   {promoted} promoted from the waitlist");
    }

    let summary = coordinator.status(&workshop).await?;
    println!("   Registered: {:?}", summary.registered_users);
    println!("   Waitlist:   {:?}\n", summary.waitlist_users);

    // ========== Scenario 2: No waitlist ==========

    println!("Scenario 2: Dinner with 1 seat and no waitlist\n");
    let dinner = EventId::new("dinner");
    app.add_event(Event::new(dinner.clone(), "Speakers Dinner", Capacity::MIN));

    coordinator.register(&dinner, &UserId::new("u0")).await?;
    println!("   u0: registered");
    match coordinator.register(&dinner, &UserId::new("u1")).await {
        Ok(_) => println!("   u1: unexpectedly admitted"),
        Err(e) => println!("   u1: rejected ({e})"),
    }

    // ========== Scenario 3: Concurrent burst ==========

    println!("\nScenario 3: 100 simultaneous registrations for 25 seats\n");
    let keynote = EventId::new("keynote");
    let seats = Capacity::new(25).ok_or("capacity must be positive")?;
    app.add_event(Event::new(keynote.clone(), "Keynote", seats).with_waitlist());

    let attendees: Vec<UserId> = (0..100).map(|n| UserId::new(format!("attendee-{n}"))).collect();
    for attendee in &attendees {
        app.add_user(User::new(attendee.clone(), attendee.as_str()));
    }

    let tasks = attendees.into_iter().map(|user_id| {
        let coordinator = coordinator.clone();
        let event_id = keynote.clone();
        tokio::spawn(async move { coordinator.register(&event_id, &user_id).await })
    });
    let failures = join_all(tasks)
        .await
        .into_iter()
        .filter(|joined| !matches!(joined, Ok(Ok(_))))
        .count();

    let summary = coordinator.status(&keynote).await?;
    println!(
        "   Registered: {} / {}, waitlisted: {}, failures: {failures}",
        summary.registered_count,
        seats.value(),
        summary.waitlist_count
    );

    if let Some(rendered) = app.render_metrics() {
        println!("\nMetrics:\n{rendered}");
    }

    println!("\nDemo complete");
    Ok(())
}
