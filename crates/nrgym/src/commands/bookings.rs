//! Booking command handler.

use chrono::{DateTime, Utc};
use tabled::Tabled;

use nrgym_api::Booking;
use nrgym_core::CoreError;

use crate::cli::{BookingsArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct BookingRow {
    #[tabled(rename = "Starts")]
    starts: String,
    #[tabled(rename = "Ends")]
    ends: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Details")]
    details: String,
}

impl From<&Booking> for BookingRow {
    fn from(b: &Booking) -> Self {
        Self {
            starts: output::local_time(&b.start),
            ends: output::opt_time(b.end.as_ref()),
            class: b.summary.clone(),
            location: b.location.clone().unwrap_or_default(),
            details: b.description.clone().unwrap_or_default(),
        }
    }
}

/// Bookings in start order; past ones are dropped unless `all`.
fn visible(mut bookings: Vec<Booking>, all: bool, now: DateTime<Utc>) -> Vec<Booking> {
    if !all {
        bookings.retain(|b| b.start >= now);
    }
    bookings.sort_by_key(|b| b.start);
    bookings
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: BookingsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let bookings = super::with_portal(global, "Fetching bookings", |c| async move {
        let club_id = c.club_id();
        c.client()
            .get_bookings(club_id)
            .await
            .map_err(CoreError::from)
    })
    .await?;

    let shown = visible(bookings, args.all, Utc::now());
    if shown.is_empty() && !global.quiet {
        eprintln!("No bookings found");
    }

    let out = output::render_list(&global.output, &shown, |b| BookingRow::from(b), |b| {
        format!("{}\t{}", b.start.to_rfc3339(), b.summary)
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn booking(summary: &str, start: DateTime<Utc>) -> Booking {
        Booking {
            summary: summary.into(),
            start,
            end: None,
            location: None,
            description: None,
        }
    }

    #[test]
    fn past_bookings_hidden_unless_all() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let bookings = vec![
            booking("Spin", now + Duration::hours(5)),
            booking("Yoga", now - Duration::hours(2)),
            booking("Boxing", now + Duration::hours(1)),
        ];

        let upcoming = visible(bookings.clone(), false, now);
        let names: Vec<_> = upcoming.iter().map(|b| b.summary.as_str()).collect();
        assert_eq!(names, ["Boxing", "Spin"]);

        assert_eq!(visible(bookings, true, now).len(), 3);
    }
}
