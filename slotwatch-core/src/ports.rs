//! Traits describing the booking backend and alert delivery, plus the
//! shared error type.

use async_trait::async_trait;
use chrono::ParseError as ChronoParseError;
use reqwest::Error as ReqwestError;

use crate::model::{Centre, CentreId, Session, Slot};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to the booking service.
///
/// None of these are recoverable by the core: a failed poll most likely
/// means an expired session, which this system has no way to renew, so
/// every variant propagates to the process boundary.
pub enum BookingError {
    /// Network layer failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// Failed to parse a timestamp from the service response.
    #[error("Parse error: {0}")]
    Parse(#[from] ChronoParseError),
    /// Login details rejected before any request was sent.
    #[error("Invalid login details: {0}")]
    Validation(String),
    /// The entry endpoint did not hand back a session cookie.
    #[error("Unable to create session, no session cookie returned")]
    Session,
    /// The service answered with a non-success status.
    #[error("Unable to fetch {path} (status {status})")]
    Api {
        /// Path that was requested.
        path: String,
        /// HTTP status the service returned.
        status: u16,
    },
    /// No centre label matched the operator's search string.
    #[error("No matching centres found for '{search}'")]
    NoCentreMatch {
        /// The search string that matched nothing.
        search: String,
    },
    /// More than one centre label matched the operator's search string.
    #[error("More than one centre found for '{search}', please be more specific (matched: {})", .matches.join("; "))]
    AmbiguousCentre {
        /// The search string that matched more than once.
        search: String,
        /// Rendered labels of every matched centre.
        matches: Vec<String>,
    },
}

#[async_trait]
/// Read access to the booking service, as needed by the watcher.
///
/// Implemented by [`crate::client::NdlsClient`] over HTTP; tests substitute
/// scripted fakes.
pub trait BookingPort: Send + Sync {
    /// Fetch the full centre directory.
    ///
    /// # Errors
    ///
    /// Returns a [`BookingError`] when the request fails.
    async fn centres(&self, session: &Session) -> Result<Vec<Centre>, BookingError>;

    /// Fetch the current slot set for one centre, flattened in service
    /// order and with per-time repeat counts expanded.
    ///
    /// # Errors
    ///
    /// Returns a [`BookingError`] when the request fails.
    async fn slots(&self, session: &Session, centre: CentreId) -> Result<Vec<Slot>, BookingError>;
}

#[async_trait]
/// Destination for "new slots found" events.
///
/// The watcher decides when to alert; how the alert reaches the operator
/// (console line, terminal bell, desktop toast) lives behind this trait.
pub trait AlertSink: Send + Sync {
    /// Deliver one alert carrying every newly discovered slot.
    async fn alert(&self, new_slots: &[Slot]);
}
