//! # Registration Core
//!
//! Domain types and the admission and promotion engines for capacity-limited
//! event registration with an optional waitlist.
//!
//! ## Core Concepts
//!
//! - **Event**: capacity plus a waitlist flag, owned by event management
//! - **Registration**: one per `(event, user)`, either registered or waitlisted
//! - **Ledger**: snapshot of one event's registrations with derived views
//! - **Admission**: registered, waitlisted at the tail, or rejected
//! - **Promotion**: next in line moves into a freed slot
//!
//! ## Architecture Principles
//!
//! - The engines are pure functions of `(Event, Ledger, now)`
//! - Storage sits behind the object-safe [`store::EntityStore`] trait
//! - Time is injected via [`environment::Clock`]
//! - Serializing operations per event is the runtime's job
//!
//! ## Example
//!
//! ```
//! use registration_core::admission::AdmissionEngine;
//! use registration_core::ledger::RegistrationLedger;
//! use registration_core::types::{Capacity, Event, EventId, UserId};
//! use chrono::Utc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let capacity = Capacity::new(1).ok_or("capacity must be positive")?;
//! let event = Event::new(EventId::new("e1"), "Meetup", capacity).with_waitlist();
//! let ledger = RegistrationLedger::new(event.id.clone(), vec![]);
//!
//! let registration = AdmissionEngine::new().admit(&event, &UserId::new("u1"), &ledger, Utc::now())?;
//! assert!(registration.is_registered());
//! # Ok(())
//! # }
//! ```

pub mod admission;
pub mod environment;
pub mod error;
pub mod ledger;
pub mod promotion;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use admission::{AdmissionDecision, AdmissionEngine};
pub use chrono::{DateTime, Utc};
pub use environment::{Clock, SystemClock};
pub use error::{RegistrationError, StoreError};
pub use ledger::RegistrationLedger;
pub use promotion::PromotionEngine;
pub use store::{EntityStore, StoreFuture};
pub use types::{
    Capacity, EntityKind, Event, EventId, EventStatus, Registration, RegistrationStatus,
    RegistrationSummary, Unregistration, User, UserId,
};
