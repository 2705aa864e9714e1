//! Admission engine.
//!
//! Decides whether a registration attempt is admitted as registered, deferred
//! to the waitlist, or rejected, and builds the record to persist.
//!
//! The engine is pure: it reads the [`RegistrationLedger`] snapshot and returns
//! a value. Persisting the result, and making sure nobody else mutates the
//! event between the read and the write, is the caller's job.
//!
//! ```text
//! existing registered      → AlreadyRegistered
//! existing waitlisted      → AlreadyWaitlisted
//! registered < capacity    → Registered
//! has_waitlist             → Waitlisted { position: tail + 1 }
//! otherwise                → CapacityExceeded
//! ```

use crate::error::RegistrationError;
use crate::ledger::RegistrationLedger;
use crate::types::{Event, Registration, RegistrationStatus, UserId};
use chrono::{DateTime, Utc};

/// Outcome of an admission decision, before a record is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// Take one of the free slots
    Register,
    /// Join the waitlist at `position`
    Waitlist {
        /// 1-based waitlist position
        position: u32,
    },
}

/// Stateless admission engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct AdmissionEngine;

impl AdmissionEngine {
    /// Creates a new `AdmissionEngine`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decide how `user_id` would be admitted to `event`.
    ///
    /// New waitlist entrants go behind the highest position currently held,
    /// so a later arrival never ranks ahead of anyone still waiting.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::AlreadyRegistered`] / [`RegistrationError::AlreadyWaitlisted`]
    ///   if the user already has a registration for the event
    /// - [`RegistrationError::CapacityExceeded`] if the event is full and has no waitlist
    pub fn decide(
        &self,
        event: &Event,
        user_id: &UserId,
        ledger: &RegistrationLedger,
    ) -> Result<AdmissionDecision, RegistrationError> {
        if let Some(existing) = ledger.get(user_id) {
            return Err(match existing.status {
                RegistrationStatus::Registered => RegistrationError::AlreadyRegistered {
                    event_id: event.id.clone(),
                    user_id: user_id.clone(),
                },
                RegistrationStatus::Waitlisted => RegistrationError::AlreadyWaitlisted {
                    event_id: event.id.clone(),
                    user_id: user_id.clone(),
                },
            });
        }

        if event.capacity.has_room_for(ledger.registered_count()) {
            return Ok(AdmissionDecision::Register);
        }

        if event.has_waitlist {
            return Ok(AdmissionDecision::Waitlist {
                position: ledger.tail_position().saturating_add(1),
            });
        }

        Err(RegistrationError::CapacityExceeded {
            event_id: event.id.clone(),
        })
    }

    /// Admit `user_id` to `event`, returning the record to persist.
    ///
    /// # Errors
    ///
    /// Same as [`AdmissionEngine::decide`].
    pub fn admit(
        &self,
        event: &Event,
        user_id: &UserId,
        ledger: &RegistrationLedger,
        now: DateTime<Utc>,
    ) -> Result<Registration, RegistrationError> {
        let registration = match self.decide(event, user_id, ledger)? {
            AdmissionDecision::Register => {
                Registration::registered(event.id.clone(), user_id.clone(), now)
            }
            AdmissionDecision::Waitlist { position } => {
                Registration::waitlisted(event.id.clone(), user_id.clone(), now, position)
            }
        };
        Ok(registration)
    }
}
