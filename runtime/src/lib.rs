//! # Registration Runtime
//!
//! Runs the registration engines from `registration-core` against a store
//! under concurrent access.
//!
//! ## Core Components
//!
//! - **Coordinator**: register, unregister and status queries
//! - **Event Locks**: at most one operation in flight per event
//! - **Guarded Store**: per-call timeouts and bounded retries of transient failures
//! - **Metrics**: admission, rejection, promotion and lock-wait instrumentation
//!
//! ## Example
//!
//! ```rust
//! use registration_runtime::{CoordinatorConfig, RegistrationCoordinator};
//! use registration_core::environment::SystemClock;
//! use registration_core::types::{Capacity, Event, EventId, User, UserId};
//! use registration_testing::InMemoryEntityStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryEntityStore::new();
//! let capacity = Capacity::new(1).ok_or("capacity must be positive")?;
//! store.insert_event(Event::new(EventId::new("e1"), "Workshop", capacity).with_waitlist());
//! store.insert_user(User::new(UserId::new("u0"), "Ada"));
//! store.insert_user(User::new(UserId::new("u1"), "Grace"));
//!
//! let coordinator = RegistrationCoordinator::new(
//!     Arc::new(store),
//!     Arc::new(SystemClock),
//!     &CoordinatorConfig::default(),
//! );
//! let event = EventId::new("e1");
//!
//! coordinator.register(&event, &UserId::new("u0")).await?;
//! let waitlisted = coordinator.register(&event, &UserId::new("u1")).await?;
//! assert_eq!(waitlisted.waitlist_position, Some(1));
//!
//! let removed = coordinator.unregister(&event, &UserId::new("u0")).await?;
//! assert_eq!(removed.promoted, Some(UserId::new("u1")));
//! # Ok(())
//! # }
//! ```

/// Coordinator tuning
pub mod config;

/// Register, unregister and status operations
pub mod coordinator;

/// Store decorator with timeouts and retries
pub mod guarded;

/// Per-event mutual exclusion
pub mod locks;

/// Prometheus metrics for observability
pub mod metrics;

/// Retry logic with exponential backoff
pub mod retry;

pub use config::CoordinatorConfig;
pub use coordinator::RegistrationCoordinator;
pub use guarded::GuardedStore;
pub use locks::{EventLocks, EventPermit};
pub use metrics::{CoordinatorMetrics, MetricsServer};
pub use retry::RetryPolicy;
