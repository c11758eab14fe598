//! Domain data structures for sessions, centres, and appointment slots.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Fixed length of every NDLS appointment, imposed by the domain rather
/// than reported by the API.
pub const SLOT_DURATION_MINUTES: i64 = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Opaque authentication token for one conversation with the booking
/// service (the PHPSESSID cookie value). Created once per run and reused
/// on every authenticated request; never rotated.
pub struct Session(String);

impl Session {
    /// Wrap a raw cookie value.
    #[must_use]
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    /// The raw cookie value, for building the `Cookie` request header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for a service centre in the NDLS directory.
pub struct CentreId(pub i64);

impl fmt::Display for CentreId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// A physical service location from the centre directory.
pub struct Centre {
    /// Unique identifier used when requesting availability.
    pub id: CentreId,
    /// Town or area name, e.g. "Ballyfermot".
    pub location: String,
    /// County the centre belongs to, e.g. "Dublin".
    pub county: String,
}

impl fmt::Display for Centre {
    /// Renders the label used for operator output and fuzzy matching:
    /// `"{location}, {county}"`.
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}, {}", self.location, self.county)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// One bookable appointment window at a centre, as a half-open interval.
///
/// Equality is interval equality on both endpoints; no other identity
/// exists. Duplicates are meaningful: they represent multiple bookable
/// appointments at the same time (e.g. several service desks).
pub struct Slot {
    /// Start of the appointment window.
    pub start: DateTime<Utc>,
    /// End of the appointment window, always `start` plus 15 minutes.
    pub end: DateTime<Utc>,
}

impl Slot {
    /// Build a slot from its start, deriving the fixed-duration end.
    #[must_use]
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: start + Duration::minutes(SLOT_DURATION_MINUTES),
        }
    }

    /// Calendar day the slot falls on.
    #[must_use]
    pub fn day(&self) -> NaiveDate {
        self.start.date_naive()
    }
}

#[derive(Debug, Clone)]
/// Driver identity submitted at login. Constructed once at the process
/// boundary (from configuration) and passed explicitly into
/// authentication.
pub struct LoginDetails {
    /// Driver number printed on the licence.
    pub driver_number: String,
    /// Date of birth, strictly `DD/MM/YYYY`.
    pub dob: String,
    /// Contact mobile number split the way the booking form expects it.
    pub mobile: Mobile,
    /// Contact email address.
    pub email: String,
    /// Preferred contact method; only `"email"` is supported.
    pub preferred_contact: String,
}

#[derive(Debug, Clone)]
/// Mobile number split into dialling prefix and the remaining digits.
pub struct Mobile {
    /// Dialling prefix, e.g. "087".
    pub prefix: String,
    /// Remainder of the number.
    pub postfix: String,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    #[test]
    fn slot_end_is_fifteen_minutes_after_start() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let slot = Slot::starting_at(start);

        assert_eq!(slot.end, Utc.with_ymd_and_hms(2024, 3, 1, 9, 15, 0).unwrap());
    }

    #[test]
    fn slots_with_equal_intervals_are_equal() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

        assert_eq!(Slot::starting_at(start), Slot::starting_at(start));
        assert_ne!(
            Slot::starting_at(start),
            Slot::starting_at(start + Duration::minutes(15))
        );
    }

    #[test]
    fn centre_label_joins_location_and_county() {
        let centre = Centre {
            id: CentreId(12),
            location: "Ballyfermot".to_owned(),
            county: "Dublin".to_owned(),
        };

        assert_eq!(centre.to_string(), "Ballyfermot, Dublin");
    }
}
