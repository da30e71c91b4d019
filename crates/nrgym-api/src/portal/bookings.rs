// Booking endpoints
//
// The portal has moved its "my bookings" data around between releases, so
// bookings are fetched by walking a candidate list until one answers with
// items. Payload shapes differ per endpoint; `extract_items` knows them all.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::endpoint::{
    BOOKING_CANDIDATES, accepts_date_range, calendar_hash, is_my_calendar, relative_path,
};
use crate::error::Error;
use crate::portal::client::{PortalCall, PortalClient};
use crate::portal::models::{Booking, first_text, first_value, parse_portal_datetime, scalar_text};

/// How far ahead ranged calendar queries look.
const BOOKING_HORIZON_DAYS: i64 = 30;

const LIST_KEYS: [&str; 5] = ["Bookings", "Items", "Data", "Result", "results"];
const CALENDAR_SECTIONS: [&str; 3] = ["RecentItems", "FutureItems", "PastItems"];
const START_KEYS: [&str; 4] = ["StartTimeUtc", "StartTime", "Start", "StartDate"];
const END_KEYS: [&str; 3] = ["EndTime", "End", "EndDate"];
const TITLE_KEYS: [&str; 3] = ["Title", "ClassName", "Name"];
const LOCATION_KEYS: [&str; 4] = ["Club", "Zone", "Location", "ClubName"];
const COACH_KEYS: [&str; 3] = ["TrainerDisplayName", "Coach", "Instructor"];

impl PortalClient {
    /// Fetch the member's bookings for `club_id`, as of now.
    pub async fn get_bookings(&self, club_id: i64) -> Result<Vec<Booking>, Error> {
        self.get_bookings_at(club_id, Utc::now()).await
    }

    /// Fetch bookings with an explicit "now".
    ///
    /// `now` drives the calendar hash date (`#/Classes/{club}/Calendar?date=`)
    /// and the `start`/`end` range sent to calendar-style endpoints.
    ///
    /// The configured override path is tried first, then the built-in
    /// candidates. The first endpoint that returns items wins; a payload that
    /// is recognized but empty means "no bookings". Auth failures abort the
    /// walk immediately; anything else moves on to the next candidate.
    pub async fn get_bookings_at(
        &self,
        club_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Booking>, Error> {
        let horizon = now + Duration::days(BOOKING_HORIZON_DAYS);
        let mut recognized_empty = false;
        let mut last_error: Option<Error> = None;

        for path in self.booking_paths() {
            let hash = is_my_calendar(&path).then(|| calendar_hash(club_id, now.date_naive()));

            let mut attempts = Vec::with_capacity(2);
            if accepts_date_range(&path) {
                attempts.push(Some((now, horizon)));
            }
            attempts.push(None);

            for range in attempts {
                let mut url = self.portal_url(&path)?;
                if let Some((start, end)) = range {
                    url.query_pairs_mut()
                        .append_pair("start", &iso(start))
                        .append_pair("end", &iso(end));
                }
                let mut call = PortalCall::get(url);
                if let Some(ref hash) = hash {
                    call = call.with_hash(hash.clone());
                }

                match self.fetch_json(&call).await {
                    Ok(payload) => match extract_items(&payload) {
                        Some(items) if !items.is_empty() => {
                            let bookings: Vec<Booking> =
                                items.iter().filter_map(normalize_booking).collect();
                            debug!(
                                endpoint = %call.endpoint(),
                                ranged = range.is_some(),
                                count = bookings.len(),
                                "fetched bookings"
                            );
                            return Ok(bookings);
                        }
                        Some(_) => recognized_empty = true,
                        None => {
                            debug!(endpoint = %call.endpoint(), "unrecognized bookings payload");
                            last_error = Some(Error::UnexpectedShape {
                                endpoint: call.endpoint(),
                                message: "no booking list in payload".into(),
                            });
                        }
                    },
                    Err(e) if e.is_auth() => return Err(e),
                    Err(e) => {
                        debug!(endpoint = %call.endpoint(), error = %e, "bookings candidate failed");
                        last_error = Some(e);
                    }
                }
            }
        }

        if recognized_empty {
            debug!("bookings endpoint answered with no items");
            return Ok(Vec::new());
        }

        warn!("no known bookings endpoint returned data; set a bookings path override");
        Err(Error::UnexpectedShape {
            endpoint: "bookings".into(),
            message: last_error.map_or_else(
                || "no bookings endpoint returned data".into(),
                |e| format!("no bookings endpoint returned data (last error: {e})"),
            ),
        })
    }

    /// Override first, then the built-in candidates, without duplicates.
    fn booking_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = Vec::with_capacity(BOOKING_CANDIDATES.len() + 1);
        let override_path = self.bookings_path().map(relative_path);
        for path in override_path.into_iter().chain(BOOKING_CANDIDATES) {
            if !paths.iter().any(|p| p == path) {
                paths.push(path.to_owned());
            }
        }
        paths
    }
}

fn iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Locate the booking list inside a payload.
///
/// `None` means the shape is not one any bookings endpoint produces;
/// `Some(vec![])` is a recognized payload with nothing booked.
pub(crate) fn extract_items(payload: &Value) -> Option<Vec<Value>> {
    let obj = match payload {
        Value::Array(items) => return Some(items.clone()),
        Value::Object(obj) => obj,
        _ => return None,
    };

    if let Some(items) = LIST_KEYS
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_array))
    {
        return Some(items.clone());
    }

    // MyCalendar: { RecentItems: { Items: [] }, FutureItems: { Items: [] }, ... }
    let sections: Vec<&Vec<Value>> = CALENDAR_SECTIONS
        .iter()
        .filter_map(|key| obj.get(*key)?.get("Items")?.as_array())
        .collect();
    if !sections.is_empty() {
        return Some(sections.into_iter().flatten().cloned().collect());
    }

    if ["Start", "StartDate", "StartTime"]
        .iter()
        .any(|key| obj.contains_key(*key))
    {
        return Some(vec![payload.clone()]);
    }

    None
}

/// Map one portal booking item onto a [`Booking`]. Items without a
/// parseable start time are dropped.
pub(crate) fn normalize_booking(item: &Value) -> Option<Booking> {
    let obj = item.as_object()?;

    let start = first_value(obj, &START_KEYS).and_then(parse_portal_datetime)?;
    let end = first_value(obj, &END_KEYS).and_then(parse_portal_datetime);
    let summary = first_text(obj, &TITLE_KEYS).unwrap_or_else(|| "Booking".into());
    let location = first_value(obj, &LOCATION_KEYS).and_then(place_name);

    let booking = Booking {
        summary,
        start,
        end,
        location,
        description: describe(obj),
    };
    debug!(
        summary = %booking.summary,
        start = %booking.start,
        location = ?booking.location,
        "normalized booking"
    );
    Some(booking)
}

/// Club/zone fields are sometimes plain names, sometimes `{ "Name": .. }`.
fn place_name(value: &Value) -> Option<String> {
    scalar_text(value).or_else(|| value.get("Name").and_then(scalar_text))
}

fn describe(obj: &Map<String, Value>) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(coach) = first_text(obj, &COACH_KEYS) {
        parts.push(format!("Coach: {coach}"));
    }
    if let Some(status) = first_text(obj, &["Status"]) {
        parts.push(format!("Status: {status}"));
    }
    if let Some(kind) = first_text(obj, &["Type"]) {
        parts.push(format!("Type: {kind}"));
    }
    if let Some(id) = first_text(obj, &["ClassBookingId"]) {
        parts.push(format!("ClassBookingId: {id}"));
    } else if let Some(id) = first_text(obj, &["BookingId"]) {
        parts.push(format!("BookingId: {id}"));
    }
    (!parts.is_empty()).then(|| parts.join("; "))
}
