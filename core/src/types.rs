//! Domain types for event registration.
//!
//! Identifiers, the read-only `Event` and `User` records owned by the CRUD
//! layer, and the `Registration` record owned by the admission and promotion
//! engines.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Identifiers
// ============================================================================

/// Error type for identifier parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid identifier: {0}")]
pub struct ParseIdError(String);

/// Caller-supplied identifier of an event.
///
/// # Validation
///
/// - `FromStr::from_str()`: rejects empty or whitespace-only input
/// - `From::from()` and `new()`: no validation (trusted input)
///
/// # Examples
///
/// ```
/// use registration_core::types::EventId;
///
/// let id = EventId::new("rustconf-2025");
/// assert_eq!(id.as_str(), "rustconf-2025");
///
/// assert!("  ".parse::<EventId>().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Create a new `EventId`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ParseIdError("Event ID cannot be empty".to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Caller-supplied identifier of a user.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a new `UserId`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ParseIdError("User ID cannot be empty".to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ============================================================================
// Value Objects
// ============================================================================

/// Number of attendees an event admits as registered. Always positive.
///
/// ```
/// use registration_core::types::Capacity;
///
/// assert_eq!(Capacity::new(2).map(Capacity::value), Some(2));
/// assert!(Capacity::new(0).is_none());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capacity(NonZeroU32);

impl Capacity {
    /// Smallest valid capacity.
    pub const MIN: Self = Self(NonZeroU32::MIN);

    /// Creates a new `Capacity`, or `None` for zero.
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        match NonZeroU32::new(value) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Returns the capacity value
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0.get()
    }

    /// Whether `registered` attendees leave room for one more.
    #[must_use]
    pub fn has_room_for(&self, registered: usize) -> bool {
        usize::try_from(self.value()).map_or(true, |capacity| registered < capacity)
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of an event, managed by the event CRUD layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Event is open
    #[default]
    Active,
    /// Event was cancelled
    Cancelled,
    /// Event already took place
    Completed,
}

// ============================================================================
// Entities
// ============================================================================

/// A capacity-limited event.
///
/// Read-only to the registration engines; only `capacity` and
/// `has_waitlist` influence admission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event identifier
    #[serde(rename = "eventId")]
    pub id: EventId,
    /// Display title
    pub title: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Calendar date of the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Venue or location
    #[serde(default)]
    pub location: String,
    /// Organizer name
    #[serde(default)]
    pub organizer: String,
    /// Maximum number of registered attendees
    pub capacity: Capacity,
    /// Whether attendees beyond capacity join a waitlist
    #[serde(default)]
    pub has_waitlist: bool,
    /// Lifecycle status
    #[serde(default)]
    pub status: EventStatus,
}

impl Event {
    /// Creates an active event without a waitlist.
    #[must_use]
    pub fn new(id: EventId, title: impl Into<String>, capacity: Capacity) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            date: None,
            location: String::new(),
            organizer: String::new(),
            capacity,
            has_waitlist: false,
            status: EventStatus::Active,
        }
    }

    /// Enables the waitlist.
    #[must_use]
    pub const fn with_waitlist(mut self) -> Self {
        self.has_waitlist = true;
        self
    }
}

/// A user who can register for events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User identifier
    #[serde(rename = "userId")]
    pub id: UserId,
    /// Display name
    pub name: String,
    /// When the user record was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Creates a user record.
    #[must_use]
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            created_at: None,
        }
    }
}

/// Whether a registration holds a slot or waits for one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    /// Holds one of the event's capacity slots
    Registered,
    /// Waiting for a slot to free up
    Waitlisted,
}

impl RegistrationStatus {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Waitlisted => "waitlisted",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's registration for one event, keyed by `(event_id, user_id)`.
///
/// `waitlist_position` is present exactly when `status` is
/// [`RegistrationStatus::Waitlisted`]. Use the constructors rather than
/// building the struct by hand to keep that pairing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Registered user
    pub user_id: UserId,
    /// Event registered for
    pub event_id: EventId,
    /// Current status
    pub status: RegistrationStatus,
    /// When the registration was admitted (promotion tie-break)
    pub registered_at: DateTime<Utc>,
    /// 1-based rank on the waitlist
    pub waitlist_position: Option<u32>,
    /// When the registration was promoted off the waitlist
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promoted_at: Option<DateTime<Utc>>,
}

impl Registration {
    /// A registration holding a slot.
    #[must_use]
    pub const fn registered(event_id: EventId, user_id: UserId, registered_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            event_id,
            status: RegistrationStatus::Registered,
            registered_at,
            waitlist_position: None,
            promoted_at: None,
        }
    }

    /// A registration waiting at `position`.
    #[must_use]
    pub const fn waitlisted(
        event_id: EventId,
        user_id: UserId,
        registered_at: DateTime<Utc>,
        position: u32,
    ) -> Self {
        Self {
            user_id,
            event_id,
            status: RegistrationStatus::Waitlisted,
            registered_at,
            waitlist_position: Some(position),
            promoted_at: None,
        }
    }

    /// Moves this registration off the waitlist.
    #[must_use]
    pub fn into_promoted(self, promoted_at: DateTime<Utc>) -> Self {
        Self {
            status: RegistrationStatus::Registered,
            waitlist_position: None,
            promoted_at: Some(promoted_at),
            ..self
        }
    }

    /// Holds a slot.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.status == RegistrationStatus::Registered
    }

    /// Waits for a slot.
    #[must_use]
    pub fn is_waitlisted(&self) -> bool {
        self.status == RegistrationStatus::Waitlisted
    }
}

/// Registration status of a single event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationSummary {
    /// Event the summary describes
    pub event_id: EventId,
    /// Number of registered users
    pub registered_count: usize,
    /// Number of waitlisted users
    pub waitlist_count: usize,
    /// Registered users, earliest admission first
    pub registered_users: Vec<UserId>,
    /// Waitlisted users, next in line first
    pub waitlist_users: Vec<UserId>,
}

/// Acknowledgment of a successful unregister.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unregistration {
    /// Event the user left
    pub event_id: EventId,
    /// User who left
    pub user_id: UserId,
    /// Status the removed registration had
    pub previous_status: RegistrationStatus,
    /// User promoted into the freed slot, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promoted: Option<UserId>,
}

/// Kind of entity a lookup failed for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// An event
    Event,
    /// A user
    User,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event => f.write_str("Event"),
            Self::User => f.write_str("User"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn timestamp() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_id_parsing_rejects_blank() {
        assert!("".parse::<EventId>().is_err());
        assert!(" \t".parse::<UserId>().is_err());
        assert_eq!("u1".parse::<UserId>().unwrap(), UserId::new("u1"));
    }

    #[test]
    fn test_capacity_rejects_zero() {
        assert!(Capacity::new(0).is_none());
        let capacity = Capacity::new(2).unwrap();
        assert!(capacity.has_room_for(1));
        assert!(!capacity.has_room_for(2));
    }

    #[test]
    fn test_capacity_value_maps_by_value() {
        let values: Vec<u32> = [1, 0, 5].into_iter().filter_map(Capacity::new).map(Capacity::value).collect();
        assert_eq!(values, vec![1, 5]);
        assert_eq!(Capacity::MIN.value(), 1);
    }

    #[test]
    fn test_capacity_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<Capacity>("0").is_err());
        assert_eq!(serde_json::from_str::<Capacity>("3").unwrap().value(), 3);
    }

    #[test]
    fn test_promotion_clears_position() {
        let waiting = Registration::waitlisted(EventId::new("e"), UserId::new("u"), timestamp(), 4);
        let promoted = waiting.into_promoted(timestamp());

        assert!(promoted.is_registered());
        assert_eq!(promoted.waitlist_position, None);
        assert_eq!(promoted.promoted_at, Some(timestamp()));
    }

    #[test]
    fn test_registration_wire_shape() {
        let registration =
            Registration::waitlisted(EventId::new("e1"), UserId::new("u1"), timestamp(), 1);
        let json = serde_json::to_value(&registration).unwrap();

        assert_eq!(json["userId"], "u1");
        assert_eq!(json["eventId"], "e1");
        assert_eq!(json["status"], "waitlisted");
        assert_eq!(json["waitlistPosition"], 1);
        assert!(json.get("promotedAt").is_none());
    }

    #[test]
    fn test_event_wire_shape() {
        let event = Event::new(EventId::new("e1"), "Meetup", Capacity::new(10).unwrap()).with_waitlist();
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["eventId"], "e1");
        assert_eq!(json["hasWaitlist"], true);
        assert_eq!(json["status"], "active");

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
