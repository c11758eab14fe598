//! HTTP client for the NDLS booking service.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, COOKIE, SET_COOKIE};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::model::{Centre, CentreId, LoginDetails, Session, Slot};
use crate::ports::{BookingError, BookingPort};

const BASE_URL: &str = "https://booking.ndls.ie";
const API_PATH: &str = "/api";
const SESSION_COOKIE_NAME: &str = "PHPSESSID";

/// Response from /api/availabilities/centres
#[derive(Debug, Deserialize)]
struct CentresResponse {
    availabilities: Vec<CentreEntry>,
}

/// Single centre from /api/availabilities/centres
#[derive(Debug, Deserialize)]
struct CentreEntry {
    ce_id: i64,
    ce_location: String,
    ce_county: String,
}

/// Response from /api/availabilities/slots/{centreId}
#[derive(Debug, Deserialize)]
struct SlotsResponse {
    slots: HashMap<String, DayAvailability>,
}

/// Per-day group of bookable times.
#[derive(Debug, Deserialize)]
struct DayAvailability {
    times: Vec<TimeEntry>,
    // a "date" field exists too, but the start timestamps carry the day
}

/// One bookable time of day with its repeat count.
#[derive(Debug, Deserialize)]
struct TimeEntry {
    st_start: String,
    count: usize,
}

/// Body of POST /api/new-booking/by-driver-number
#[derive(Debug, Serialize)]
struct LoginRequest<'details> {
    dr_drivernumber: &'details str,
    dr_dob: &'details str,
    #[serde(rename = "mobilePrefix")]
    mobile_prefix: &'details str,
    mobile: &'details str,
    dr_email: &'details str,
    dr_preferredcontact: &'static str,
    tandc: bool,
}

/// Client for the NDLS session, centre-directory, and availability
/// endpoints. One instance (and its inner HTTP client) is shared across
/// all calls for the process lifetime.
pub struct NdlsClient {
    client: Client,
    base_url: String,
}

impl NdlsClient {
    /// Create a client against the production booking service.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, BASE_URL)
    }

    /// Create a client against an alternative base URL (test fixtures).
    #[must_use]
    pub fn with_base_url<S: Into<String>>(client: Client, base_url: S) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Establish an unauthenticated session by requesting the booking
    /// entry page and lifting the session cookie from the response.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Session`] when no session cookie comes
    /// back; this is a fatal startup condition, never retried.
    pub async fn create_session(&self) -> Result<Session, BookingError> {
        let path = "/new-booking-by-driver-number";
        let response =
            send_checked(self.client.get(format!("{}{path}", self.base_url)), path).await?;

        extract_session_cookie(response.headers()).ok_or(BookingError::Session)
    }

    /// Submit the driver's identity under the session cookie.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] before any request is sent
    /// when the date of birth is not `DD/MM/YYYY` or the preferred
    /// contact method is not `email`, and [`BookingError::Api`] on a
    /// non-success response.
    pub async fn login(
        &self,
        session: &Session,
        details: &LoginDetails,
    ) -> Result<(), BookingError> {
        validate_details(details)?;

        let body = LoginRequest {
            dr_drivernumber: &details.driver_number,
            dr_dob: &details.dob,
            mobile_prefix: &details.mobile.prefix,
            mobile: &details.mobile.postfix,
            dr_email: &details.email,
            dr_preferredcontact: "E",
            tandc: true,
        };

        let path = "/new-booking/by-driver-number";
        let request = with_session(self.client.post(self.api_url(path)), session).json(&body);
        send_checked(request, path).await?;

        Ok(())
    }

    /// Compose [`Self::create_session`] and [`Self::login`]. When login
    /// fails, the half-created session is dropped, never returned.
    ///
    /// # Errors
    ///
    /// Propagates any failure from either step.
    pub async fn create_authenticated_session(
        &self,
        details: &LoginDetails,
    ) -> Result<Session, BookingError> {
        let session = self.create_session().await?;

        self.login(&session, details).await?;

        Ok(session)
    }

    /// GET an API endpoint under the session cookie and decode its JSON.
    async fn api_get<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
    ) -> Result<T, BookingError> {
        let request = with_session(self.client.get(self.api_url(path)), session);
        let response = send_checked(request, path).await?;

        Ok(response.json().await?)
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{API_PATH}{path}", self.base_url)
    }
}

/// Attach the session cookie to a request.
fn with_session(builder: RequestBuilder, session: &Session) -> RequestBuilder {
    builder.header(
        COOKIE,
        format!("{SESSION_COOKIE_NAME}={}", session.as_str()),
    )
}

#[async_trait]
impl BookingPort for NdlsClient {
    async fn centres(&self, session: &Session) -> Result<Vec<Centre>, BookingError> {
        let response: CentresResponse = self.api_get(session, "/availabilities/centres").await?;

        Ok(response
            .availabilities
            .into_iter()
            .map(|entry| Centre {
                id: CentreId(entry.ce_id),
                location: entry.ce_location,
                county: entry.ce_county,
            })
            .collect())
    }

    async fn slots(&self, session: &Session, centre: CentreId) -> Result<Vec<Slot>, BookingError> {
        let response: SlotsResponse = self
            .api_get(session, &format!("/availabilities/slots/{centre}"))
            .await?;

        flatten_slots(response)
    }
}

/// Expand the grouped-by-day availability response into the flat slot
/// sequence. Each `(st_start, count)` pair becomes `count` independent
/// slots sharing the same interval: the duplicates are real, standing for
/// multiple bookable appointments at the same time.
fn flatten_slots(response: SlotsResponse) -> Result<Vec<Slot>, BookingError> {
    let mut slots = Vec::new();

    for day in response.slots.into_values() {
        for time in day.times {
            let start: DateTime<Utc> = time.st_start.parse()?;
            slots.extend(std::iter::repeat_n(Slot::starting_at(start), time.count));
        }
    }

    Ok(slots)
}

/// Find the session cookie among the response's Set-Cookie headers.
fn extract_session_cookie(headers: &HeaderMap) -> Option<Session> {
    for header in headers.get_all(SET_COOKIE) {
        let Ok(raw) = header.to_str() else {
            continue;
        };

        for segment in raw.split(';') {
            let mut parts = segment.splitn(2, '=');
            let name = parts.next().map(str::trim);
            let value = parts.next().map(str::trim);

            if let (Some(SESSION_COOKIE_NAME), Some(value)) = (name, value) {
                return Some(Session::new(value));
            }
        }
    }

    None
}

fn validate_details(details: &LoginDetails) -> Result<(), BookingError> {
    if !is_dob_shape(&details.dob) {
        return Err(BookingError::Validation(
            r#"Driver DOB must be in the form of "DD/MM/YYYY""#.to_owned(),
        ));
    }

    if details.preferred_contact != "email" {
        return Err(BookingError::Validation(
            "Preferred contact where not email is not yet supported".to_owned(),
        ));
    }

    Ok(())
}

/// Strict `DD/MM/YYYY` shape check; calendar validity is the service's
/// concern, the shape is ours.
fn is_dob_shape(dob: &str) -> bool {
    let bytes = dob.as_bytes();

    bytes.len() == 10
        && bytes.iter().enumerate().all(|(index, byte)| match index {
            2 | 5 => *byte == b'/',
            _ => byte.is_ascii_digit(),
        })
}

// Small helper to send a request and reject non-success statuses with the
// requested path attached.
async fn send_checked(req: RequestBuilder, path: &str) -> Result<Response, BookingError> {
    let response = req.send().await?;
    let status = response.status();

    if !status.is_success() {
        return Err(BookingError::Api {
            path: path.to_owned(),
            status: status.as_u16(),
        });
    }

    Ok(response)
}
