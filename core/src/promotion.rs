//! Promotion engine.
//!
//! Picks the next waitlisted entrant after a registered entrant leaves and
//! moves it into the freed slot. The caller invokes it exactly once per freed
//! slot, which is what keeps the registered count within capacity; the engine
//! does not re-check capacity itself.

use crate::ledger::RegistrationLedger;
use crate::types::Registration;
use chrono::{DateTime, Utc};

/// Stateless promotion engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct PromotionEngine;

impl PromotionEngine {
    /// Creates a new `PromotionEngine`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Next entrant in line: lowest position, then earliest `registered_at`.
    #[must_use]
    pub fn next_in_line<'a>(&self, ledger: &'a RegistrationLedger) -> Option<&'a Registration> {
        ledger.waitlist().into_iter().next()
    }

    /// The promoted record for the next entrant in line, or `None` when the
    /// waitlist is empty.
    #[must_use]
    pub fn promote(&self, ledger: &RegistrationLedger, now: DateTime<Utc>) -> Option<Registration> {
        self.next_in_line(ledger)
            .map(|next| next.clone().into_promoted(now))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{EventId, UserId};
    use chrono::Duration;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
            + Duration::seconds(seconds)
    }

    fn waitlisted(user: &str, position: u32, seconds: i64) -> Registration {
        Registration::waitlisted(EventId::new("e1"), UserId::new(user), at(seconds), position)
    }

    #[test]
    fn test_promotes_lowest_position() {
        let ledger = RegistrationLedger::new(
            EventId::new("e1"),
            vec![
                Registration::registered(EventId::new("e1"), UserId::new("r"), at(0)),
                waitlisted("third", 3, 1),
                waitlisted("second", 2, 2),
            ],
        );

        let promoted = PromotionEngine::new().promote(&ledger, at(10)).unwrap();

        assert_eq!(promoted.user_id, UserId::new("second"));
        assert!(promoted.is_registered());
        assert_eq!(promoted.waitlist_position, None);
        assert_eq!(promoted.promoted_at, Some(at(10)));
        assert_eq!(promoted.registered_at, at(2));
    }

    #[test]
    fn test_equal_positions_fall_back_to_arrival() {
        let ledger = RegistrationLedger::new(
            EventId::new("e1"),
            vec![waitlisted("later", 1, 5), waitlisted("earlier", 1, 4)],
        );

        let next = PromotionEngine::new().next_in_line(&ledger).unwrap();

        assert_eq!(next.user_id, UserId::new("earlier"));
    }

    #[test]
    fn test_empty_waitlist_promotes_nobody() {
        let ledger = RegistrationLedger::new(
            EventId::new("e1"),
            vec![Registration::registered(EventId::new("e1"), UserId::new("r"), at(0))],
        );

        assert!(PromotionEngine::new().promote(&ledger, at(1)).is_none());
    }
}
