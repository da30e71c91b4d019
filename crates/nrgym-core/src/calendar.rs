// ── Calendars ──
//
// Two calendars: the member's class bookings, and the next membership
// payment as a zero-length event.

use chrono::{DateTime, Utc};
use nrgym_api::{Booking, Contracts};
use serde_json::{Map, Value};

use crate::model::{CalendarEvent, Entity, EntityState, Snapshot};

/// Both calendar entities for a snapshot.
pub fn calendars(snapshot: &Snapshot) -> Vec<Entity> {
    vec![bookings_calendar(snapshot), payment_calendar(snapshot)]
}

fn booking_event(booking: &Booking) -> CalendarEvent {
    CalendarEvent {
        summary: booking.summary.clone(),
        start: booking.start,
        end: booking.end.unwrap_or(booking.start),
        location: booking.location.clone(),
        description: booking.description.clone(),
    }
}

fn event_attributes(event: Option<&CalendarEvent>, extra: Map<String, Value>) -> Map<String, Value> {
    let mut attributes = extra;
    if let Some(event) = event {
        attributes.insert("message".into(), event.summary.clone().into());
        attributes.insert("start_time".into(), event.start.to_rfc3339().into());
        attributes.insert("end_time".into(), event.end.to_rfc3339().into());
        if let Some(ref location) = event.location {
            attributes.insert("location".into(), location.clone().into());
        }
    }
    attributes
}

// ── Bookings calendar ────────────────────────────────────────────

/// The bookings calendar's current event: the first booking returned.
pub fn current_booking_event(snapshot: &Snapshot) -> Option<CalendarEvent> {
    snapshot.bookings.get()?.first().map(booking_event)
}

/// Bookings whose start falls within `[from, to]`.
pub fn booking_events(
    snapshot: &Snapshot,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Vec<CalendarEvent> {
    snapshot
        .bookings
        .get()
        .map(|bookings| {
            bookings
                .iter()
                .filter(|b| b.start >= from && b.start <= to)
                .map(booking_event)
                .collect()
        })
        .unwrap_or_default()
}

fn bookings_calendar(snapshot: &Snapshot) -> Entity {
    let entity = Entity::calendar("bookings", "NRG Upcoming Bookings").icon("mdi:calendar");
    let Some(bookings) = snapshot.bookings.get() else {
        return entity.unavailable();
    };
    let current = current_booking_event(snapshot);
    let mut count = Map::new();
    count.insert("count".into(), bookings.len().into());

    entity
        .state(EntityState::from_option(
            current.as_ref().map(|e| e.summary.clone()),
        ))
        .attributes(event_attributes(current.as_ref(), count))
}

// ── Next payment calendar ────────────────────────────────────────

/// Zero-length event on the active contract's next payment date.
pub fn next_payment_event(contracts: &Contracts) -> Option<CalendarEvent> {
    let next = contracts.next_payment()?;
    let date = next.date?;
    let amount = next.amount_formatted();
    let name = next.contract.clone();

    let summary = amount
        .as_ref()
        .map(|a| format!("{a} due"))
        .or_else(|| name.clone())
        .unwrap_or_else(|| "Membership Payment".into());
    let mut description = format!(
        "Next payment for {}",
        name.as_deref().unwrap_or("membership")
    );
    if let Some(ref amount) = amount {
        description.push_str(&format!(" ({amount})"));
    }

    Some(CalendarEvent {
        summary,
        start: date,
        end: date,
        location: next.club_name,
        description: Some(description),
    })
}

/// The payment event, if it falls within `[from, to]`.
pub fn payment_events(
    snapshot: &Snapshot,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Vec<CalendarEvent> {
    snapshot
        .contracts
        .get()
        .and_then(next_payment_event)
        .filter(|e| e.start >= from && e.start <= to)
        .into_iter()
        .collect()
}

fn payment_calendar(snapshot: &Snapshot) -> Entity {
    let entity = Entity::calendar("next_payment", "NRG Next Payment").icon("mdi:cash-clock");
    let Some(contracts) = snapshot.contracts.get() else {
        return entity.unavailable();
    };
    let event = next_payment_event(contracts);
    let next = contracts.next_payment();

    let mut extra = Map::new();
    if let Some(next) = next {
        extra.insert("contract".into(), next.contract.clone().into());
        extra.insert(
            "next_payment_date".into(),
            next.date.map(|d| d.to_rfc3339()).into(),
        );
        extra.insert("amount".into(), next.amount.into());
        extra.insert("amount_formatted".into(), next.amount_formatted().into());
    }

    entity
        .state(EntityState::from_option(event.as_ref().map(|e| e.summary.clone())))
        .attributes(event_attributes(event.as_ref(), extra))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use nrgym_api::Contract;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::Section;

    fn at(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, d, 12, 0, 0).unwrap()
    }

    fn booking(summary: &str, d: u32) -> Booking {
        Booking {
            summary: summary.into(),
            start: at(d),
            end: None,
            location: None,
            description: None,
        }
    }

    fn contract(gross: Option<f64>, date: Option<DateTime<Utc>>) -> Contracts {
        Contracts::new(vec![Contract {
            name: Some("Flex".into()),
            club_name: Some("Leeds".into()),
            cost_gross: gross,
            next_payment_date: date,
            ..Contract::default()
        }])
    }

    #[test]
    fn booking_window_is_inclusive_and_end_defaults_to_start() {
        let mut s = Snapshot::empty(5);
        s.bookings = Section::Available(vec![booking("A", 2), booking("B", 5), booking("C", 9)]);

        let events = booking_events(&s, at(2), at(5));
        let names: Vec<_> = events.iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
        assert_eq!(events[0].end, events[0].start);

        assert_eq!(current_booking_event(&s).unwrap().summary, "A");
    }

    #[test]
    fn payment_event_summary_variants() {
        let with_amount = next_payment_event(&contract(Some(30.0), Some(at(1)))).unwrap();
        assert_eq!(with_amount.summary, "£30.00 due");
        assert_eq!(with_amount.start, with_amount.end);
        assert_eq!(with_amount.location.as_deref(), Some("Leeds"));
        assert_eq!(
            with_amount.description.as_deref(),
            Some("Next payment for Flex (£30.00)")
        );

        let without_amount = next_payment_event(&contract(None, Some(at(1)))).unwrap();
        assert_eq!(without_amount.summary, "Flex");

        assert_eq!(next_payment_event(&contract(Some(1.0), None)), None);
        assert_eq!(next_payment_event(&Contracts::default()), None);
    }

    #[test]
    fn payment_events_respect_window() {
        let mut s = Snapshot::empty(5);
        s.contracts = Section::Available(contract(Some(30.0), Some(at(10))));
        assert_eq!(payment_events(&s, at(1), at(9)), Vec::new());
        assert_eq!(payment_events(&s, at(1), at(10)).len(), 1);
    }

    #[test]
    fn calendars_follow_section_availability() {
        let mut s = Snapshot::empty(5);
        s.bookings = Section::Available(vec![booking("Spin", 3)]);
        let calendars = calendars(&s);

        assert_eq!(calendars[0].state, EntityState::Value(json!("Spin")));
        assert_eq!(calendars[0].attributes["count"], json!(1));
        assert_eq!(calendars[1].state, EntityState::Unavailable);
    }
}
