//! Error types for registration operations.
//!
//! Business-rule failures are deterministic given the current registration
//! set and are never retried. Store failures come from the backing
//! [`EntityStore`](crate::store::EntityStore); only
//! [`StoreError::Transient`] is worth retrying.

use crate::types::{EntityKind, EventId, UserId};
use std::time::Duration;
use thiserror::Error;

/// Errors reported by the backing entity store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Store cannot be reached. Fail fast.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Short-lived failure (throttling, dropped connection).
    #[error("Transient store error: {0}")]
    Transient(String),

    /// Store call exceeded its deadline.
    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    /// Record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Whether retrying the same call may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Errors returned by registration operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The event or user does not exist.
    #[error("{kind} with ID {id} not found")]
    EntityNotFound {
        /// Which kind of entity was missing
        kind: EntityKind,
        /// Identifier that was looked up
        id: String,
    },

    /// The user already holds a slot for the event.
    #[error("User {user_id} is already registered for event {event_id}")]
    AlreadyRegistered {
        /// Event
        event_id: EventId,
        /// User
        user_id: UserId,
    },

    /// The user is already on the event's waitlist.
    #[error("User {user_id} is already on the waitlist for event {event_id}")]
    AlreadyWaitlisted {
        /// Event
        event_id: EventId,
        /// User
        user_id: UserId,
    },

    /// The event is full and has no waitlist.
    #[error("Event {event_id} is full and has no waitlist")]
    CapacityExceeded {
        /// Event
        event_id: EventId,
    },

    /// No registration exists for the pair.
    #[error("User {user_id} is not registered or waitlisted for event {event_id}")]
    NotRegistered {
        /// Event
        event_id: EventId,
        /// User
        user_id: UserId,
    },

    /// Backing store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RegistrationError {
    /// Missing event.
    #[must_use]
    pub fn event_not_found(event_id: &EventId) -> Self {
        Self::EntityNotFound {
            kind: EntityKind::Event,
            id: event_id.to_string(),
        }
    }

    /// Missing user.
    #[must_use]
    pub fn user_not_found(user_id: &UserId) -> Self {
        Self::EntityNotFound {
            kind: EntityKind::User,
            id: user_id.to_string(),
        }
    }

    /// `AlreadyRegistered` or `AlreadyWaitlisted`.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Self::AlreadyRegistered { .. } | Self::AlreadyWaitlisted { .. }
        )
    }

    /// Anything other than a store failure.
    #[must_use]
    pub const fn is_business_rule(&self) -> bool {
        !matches!(self, Self::Store(_))
    }

    /// Short label used for metrics and logs.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::EntityNotFound { .. } => "not_found",
            Self::AlreadyRegistered { .. } => "already_registered",
            Self::AlreadyWaitlisted { .. } => "already_waitlisted",
            Self::CapacityExceeded { .. } => "capacity_exceeded",
            Self::NotRegistered { .. } => "not_registered",
            Self::Store(_) => "store",
        }
    }
}
