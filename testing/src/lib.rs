//! # Registration Testing
//!
//! Testing utilities for the registration workspace.
//!
//! This crate provides:
//! - Deterministic [`Clock`] implementations
//! - [`InMemoryEntityStore`]: `HashMap`-backed entity store with optional
//!   simulated latency to force interleavings
//! - [`FaultyStore`]: wraps a store and injects failures
//! - Fixture helpers for seeding events and users
//!
//! ## Example
//!
//! ```
//! use registration_testing::{fixtures, InMemoryEntityStore};
//!
//! let store = InMemoryEntityStore::new();
//! let event = fixtures::seed_event(&store, "e1", 2, true);
//! fixtures::seed_users(&store, ["u0", "u1"]);
//! assert!(event.has_waitlist);
//! assert_eq!(store.user_count(), 2);
//! ```

use chrono::{DateTime, Duration, Utc};
use registration_core::environment::Clock;

mod faulty;
mod memory;

pub use faulty::{FaultyStore, InjectedFault};
pub use memory::InMemoryEntityStore;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Duration, Utc};
    use std::sync::Mutex;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use registration_testing::mocks::FixedClock;
    /// use registration_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that advances by a fixed step on every read.
    ///
    /// Gives every admission a distinct, strictly increasing timestamp.
    ///
    /// ```
    /// use registration_testing::mocks::SteppingClock;
    /// use registration_core::environment::Clock;
    ///
    /// let clock = SteppingClock::default();
    /// assert!(clock.now() < clock.now());
    /// ```
    #[derive(Debug)]
    pub struct SteppingClock {
        next: Mutex<DateTime<Utc>>,
        step: Duration,
    }

    impl SteppingClock {
        /// Start at `start`, advancing by `step` per call.
        #[must_use]
        pub const fn new(start: DateTime<Utc>, step: Duration) -> Self {
            Self {
                next: Mutex::new(start),
                step,
            }
        }
    }

    impl Default for SteppingClock {
        fn default() -> Self {
            Self::new(epoch(), Duration::milliseconds(1))
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            let mut next = self
                .next
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let current = *next;
            *next = current + self.step;
            current
        }
    }

    /// 2025-01-01 00:00:00 UTC.
    #[must_use]
    pub fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default()
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(epoch())
    }
}

/// Fixture helpers.
pub mod fixtures {
    use crate::InMemoryEntityStore;
    use registration_core::types::{Capacity, Event, EventId, User, UserId};

    /// Insert an event with the given capacity. A zero capacity is raised to one.
    pub fn seed_event(
        store: &InMemoryEntityStore,
        id: &str,
        capacity: u32,
        has_waitlist: bool,
    ) -> Event {
        let capacity = Capacity::new(capacity).unwrap_or(Capacity::MIN);
        let mut event = Event::new(EventId::new(id), format!("Event {id}"), capacity);
        event.has_waitlist = has_waitlist;
        store.insert_event(event.clone());
        event
    }

    /// Insert one user per id.
    pub fn seed_users<I, S>(store: &InMemoryEntityStore, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            let id = id.as_ref();
            store.insert_user(User::new(UserId::new(id), format!("User {id}")));
        }
    }

    /// `["u0", "u1", ...]` of length `count`.
    #[must_use]
    pub fn user_ids(count: usize) -> Vec<String> {
        (0..count).map(|n| format!("u{n}")).collect()
    }
}

/// Install a test-friendly `tracing` subscriber once per process.
///
/// Honors `RUST_LOG`; silent by default.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off")),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FixedClock, SteppingClock, test_clock};
