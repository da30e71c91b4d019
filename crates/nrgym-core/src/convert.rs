// ── Snapshot → sensors ──
//
// Pure mapping from a refresh snapshot to the sensor entities a host shows.
// Every sensor reads from one or two snapshot sections; when its section is
// unavailable, so is the sensor.

use chrono::{DateTime, Utc};
use nrgym_api::{Booking, ClubOccupancy, Contracts, Identity, Occupancy, Profile};
use serde_json::{Map, Value, json};

use crate::calendar;
use crate::model::{Entity, EntityState, Section, Snapshot};

const OCCUPANCY_ICON: &str = "mdi:account-group";
const OCCUPANCY_OTHER_ICON: &str = "mdi:account-group-outline";

/// Every entity for a snapshot: sensors first, then calendars.
pub fn entities(snapshot: &Snapshot, now: DateTime<Utc>) -> Vec<Entity> {
    let mut all = sensors(snapshot, now);
    all.extend(calendar::calendars(snapshot));
    all
}

/// All sensor entities for a snapshot, evaluated at `now`.
pub fn sensors(snapshot: &Snapshot, now: DateTime<Utc>) -> Vec<Entity> {
    let identity = snapshot.identity.get();

    let mut sensors = vec![
        upcoming_bookings_count(&snapshot.bookings),
        next_booking(&snapshot.bookings, now),
        occupancy_total(&snapshot.occupancy),
    ];
    if let Some(occupancy) = snapshot.occupancy.get() {
        sensors.extend(club_occupancy(occupancy, identity));
    }
    sensors.extend([
        profile(&snapshot.profile, identity),
        member_id(&snapshot.profile),
        email(&snapshot.profile),
        home_club(&snapshot.profile, identity),
        active_contract(&snapshot.contracts),
        next_payment_amount(&snapshot.contracts),
    ]);
    sensors
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Build an entity from an available section, or mark it unavailable.
fn from_section<T>(
    section: &Section<T>,
    entity: Entity,
    build: impl FnOnce(&T, Entity) -> Entity,
) -> Entity {
    match section.get() {
        Some(value) => build(value, entity),
        None => entity.unavailable(),
    }
}

// ── Bookings ─────────────────────────────────────────────────────

fn upcoming_bookings_count(bookings: &Section<Vec<Booking>>) -> Entity {
    let entity = Entity::sensor("count", "NRG Upcoming Bookings Count");
    from_section(bookings, entity, |bookings, e| {
        e.state(EntityState::Value(bookings.len().into()))
    })
}

/// Earliest booking starting at or after `now`.
pub fn upcoming_booking(bookings: &[Booking], now: DateTime<Utc>) -> Option<&Booking> {
    bookings
        .iter()
        .filter(|b| b.start >= now)
        .min_by_key(|b| b.start)
}

fn next_booking(bookings: &Section<Vec<Booking>>, now: DateTime<Utc>) -> Entity {
    let entity = Entity::sensor("next", "NRG Next Booking");
    from_section(bookings, entity, |bookings, e| {
        let Some(booking) = upcoming_booking(bookings, now) else {
            return e;
        };
        let when = booking.start.format("%Y-%m-%d %H:%M");
        let label = match booking.location {
            Some(ref location) => format!("{} @ {location} on {when}", booking.summary),
            None => format!("{} on {when}", booking.summary),
        };
        e.state(EntityState::Value(label.into()))
            .attributes(object(json!({
                "summary": booking.summary,
                "start": booking.start,
                "end": booking.end,
                "location": booking.location,
                "description": booking.description,
            })))
    })
}

// ── Occupancy ────────────────────────────────────────────────────

fn occupancy_total(occupancy: &Section<Occupancy>) -> Entity {
    let entity = Entity::sensor("occupancy_total", "NRG Club Occupancy Total").icon(OCCUPANCY_ICON);
    from_section(occupancy, entity, |occupancy, e| {
        let clubs: Map<String, Value> = occupancy
            .clubs
            .iter()
            .filter(|c| !c.name.is_empty())
            .map(|c| (c.name.clone(), c.members.into()))
            .collect();
        e.state(EntityState::Value(occupancy.total.into()))
            .attributes(object(json!({
                "clubs": clubs,
                "count": occupancy.clubs.len(),
            })))
    })
}

/// Unique suffix for a club sensor: the club id, or a slug of its name.
pub fn club_key(club: &ClubOccupancy) -> String {
    match club.id {
        Some(id) if id != 0 => format!("occupancy_{id}"),
        _ => format!("occupancy_{}", club.name.replace(' ', "_").to_lowercase()),
    }
}

/// One sensor per club. Only the preferred club (the member's home club,
/// else the first club listed) is enabled by default.
fn club_occupancy(occupancy: &Occupancy, identity: Option<&Identity>) -> Vec<Entity> {
    let home = identity.and_then(|i| i.home_club_id);
    let first = occupancy.clubs.first();

    occupancy
        .clubs
        .iter()
        .map(|club| {
            let preferred = match home {
                Some(home) => club.id == Some(home),
                None => first.is_some_and(|f| match f.id {
                    Some(id) => club.id == Some(id),
                    None => club.name == f.name,
                }),
            };
            let entity = Entity::sensor(club_key(club), format!("NRG {} Occupancy", club.name))
                .state(EntityState::Value(club.members.into()));
            if preferred {
                entity.icon(OCCUPANCY_ICON)
            } else {
                entity.icon(OCCUPANCY_OTHER_ICON).disabled_by_default()
            }
        })
        .collect()
}

// ── Profile ──────────────────────────────────────────────────────

fn profile(profile: &Section<Profile>, identity: Option<&Identity>) -> Entity {
    let entity = Entity::sensor("profile", "NRG Profile").icon("mdi:account");
    from_section(profile, entity, |p, e| {
        let mut e = e
            .state(EntityState::from_option(p.full_name.clone()))
            .attributes(object(json!({
                "user_id": p.user_id,
                "email": p.email,
                "first_name": p.first_name,
                "last_name": p.last_name,
                "phone": p.phone,
                "referral_code": p.referral_code,
                "photo_url": p.photo_url,
                "home_club_id": identity.and_then(|i| i.home_club_id),
                "default_club_id": identity.and_then(|i| i.default_club_id),
                "club_name": p.club_name,
            })));
        e.entity_picture.clone_from(&p.photo_url);
        e
    })
}

fn member_id(profile: &Section<Profile>) -> Entity {
    let entity = Entity::sensor("member_id", "NRG Member ID").icon("mdi:card-account-details");
    from_section(profile, entity, |p, e| {
        e.state(EntityState::from_option(p.user_id))
    })
}

fn email(profile: &Section<Profile>) -> Entity {
    let entity = Entity::sensor("email", "NRG Email").icon("mdi:email");
    from_section(profile, entity, |p, e| {
        e.state(EntityState::from_option(p.email.clone()))
    })
}

fn home_club(profile: &Section<Profile>, identity: Option<&Identity>) -> Entity {
    let entity = Entity::sensor("home_club", "NRG Home Club").icon("mdi:home-account");
    from_section(profile, entity, |p, e| {
        let home_id = identity.and_then(|i| i.home_club_id);
        let label = match (p.club_name.as_deref(), home_id) {
            (Some(name), Some(id)) => Some(format!("{name} ({id})")),
            (Some(name), None) => Some(name.to_owned()),
            (None, Some(id)) => Some(id.to_string()),
            (None, None) => None,
        };
        e.state(EntityState::from_option(label))
    })
}

// ── Contracts ────────────────────────────────────────────────────

fn active_contract(contracts: &Section<Contracts>) -> Entity {
    let entity = Entity::sensor("active_contract", "NRG Active Contract").icon("mdi:file-document");
    from_section(contracts, entity, |contracts, e| {
        let Some(ref c) = contracts.active else {
            return e;
        };
        e.state(EntityState::from_option(c.name.clone()))
            .attributes(object(json!({
                "contract_id": c.id,
                "club_name": c.club_name,
                "club_id": c.club_id,
                "start_date": c.start_date,
                "end_date": c.end_date,
                "commitment_date": c.commitment_date,
                "next_payment_date": c.next_payment_date,
                "payment_interval": c.payment_interval,
                "commitment_period": c.commitment_period,
                "cost_gross": c.cost_gross,
                "cost_net": c.cost_net,
                "cost_tax": c.cost_tax,
                "addons": c.addons,
                "description": c.short_description,
            })))
    })
}

fn next_payment_amount(contracts: &Section<Contracts>) -> Entity {
    let entity = Entity::sensor("next_payment_amount", "NRG Next Payment Amount")
        .icon("mdi:cash")
        .unit("GBP");
    from_section(contracts, entity, |contracts, e| {
        let Some(next) = contracts.next_payment() else {
            return e;
        };
        e.state(EntityState::from_option(next.amount))
            .attributes(object(json!({
                "contract": next.contract,
                "next_payment_date": next.date,
                "commitment_period": next.commitment_period,
                "amount_formatted": next.amount_formatted(),
            })))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use nrgym_api::Contract;
    use pretty_assertions::assert_eq;

    use super::*;

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, d, h, 0, 0).unwrap()
    }

    fn booking(summary: &str, start: DateTime<Utc>, location: Option<&str>) -> Booking {
        Booking {
            summary: summary.into(),
            start,
            end: None,
            location: location.map(String::from),
            description: None,
        }
    }

    fn club(id: Option<i64>, name: &str, members: u32) -> ClubOccupancy {
        ClubOccupancy {
            id,
            name: name.into(),
            members,
        }
    }

    fn find<'a>(entities: &'a [Entity], key: &str) -> &'a Entity {
        entities.iter().find(|e| e.key == key).unwrap()
    }

    fn snapshot() -> Snapshot {
        let mut s = Snapshot::empty(5);
        s.bookings = Section::Available(vec![
            booking("Past", at(1, 9), None),
            booking("Box", at(20, 18), None),
            booking("Spin", at(15, 7), Some("Studio 1")),
        ]);
        s.occupancy = Section::Available(Occupancy::from_clubs(vec![
            club(Some(5), "Manchester", 40),
            club(Some(9), "Leeds", 12),
        ]));
        s.identity = Section::Available(Identity {
            user_id: Some(42),
            home_club_id: Some(9),
            ..Identity::default()
        });
        s.profile = Section::Available(Profile {
            user_id: Some(42),
            full_name: Some("Alex Rivera".into()),
            email: Some("alex@example.com".into()),
            club_name: Some("Leeds".into()),
            photo_url: Some("https://cdn.example.com/a.jpg".into()),
            ..Profile::default()
        });
        s.contracts = Section::Available(Contracts::new(vec![Contract {
            name: Some("Flex Monthly".into()),
            cost_gross: Some(24.5),
            ..Contract::default()
        }]));
        s
    }

    #[test]
    fn next_booking_picks_nearest_future() {
        let sensors = sensors(&snapshot(), at(10, 0));
        let next = find(&sensors, "next");
        assert_eq!(
            next.state,
            EntityState::Value("Spin @ Studio 1 on 2025-03-15 07:00".into())
        );
        assert_eq!(next.attributes["summary"], json!("Spin"));
        assert_eq!(find(&sensors, "count").state, EntityState::Value(3.into()));
    }

    #[test]
    fn next_booking_without_location_or_future() {
        let sensors_mid = sensors(&snapshot(), at(16, 0));
        assert_eq!(
            find(&sensors_mid, "next").state,
            EntityState::Value("Box on 2025-03-20 18:00".into())
        );

        let sensors_late = sensors(&snapshot(), at(25, 0));
        let next = find(&sensors_late, "next");
        assert_eq!(next.state, EntityState::Unknown);
        assert!(next.attributes.is_empty());
    }

    #[test]
    fn occupancy_sensors_prefer_home_club() {
        let sensors = sensors(&snapshot(), at(10, 0));
        let total = find(&sensors, "occupancy_total");
        assert_eq!(total.state, EntityState::Value(52.into()));
        assert_eq!(total.attributes["clubs"], json!({ "Manchester": 40, "Leeds": 12 }));
        assert_eq!(total.attributes["count"], json!(2));

        assert!(!find(&sensors, "occupancy_5").enabled_by_default);
        let leeds = find(&sensors, "occupancy_9");
        assert!(leeds.enabled_by_default);
        assert_eq!(leeds.name, "NRG Leeds Occupancy");
    }

    #[test]
    fn first_club_preferred_without_identity() {
        let mut s = snapshot();
        s.identity = Section::Unavailable("boom".into());
        s.occupancy = Section::Available(Occupancy::from_clubs(vec![
            club(None, "City Centre", 3),
            club(None, "Docks", 1),
        ]));
        let sensors = sensors(&s, at(10, 0));
        assert!(find(&sensors, "occupancy_city_centre").enabled_by_default);
        assert!(!find(&sensors, "occupancy_docks").enabled_by_default);
    }

    #[test]
    fn profile_sensors() {
        let sensors = sensors(&snapshot(), at(10, 0));
        let profile = find(&sensors, "profile");
        assert_eq!(profile.state, EntityState::Value("Alex Rivera".into()));
        assert_eq!(
            profile.entity_picture.as_deref(),
            Some("https://cdn.example.com/a.jpg")
        );
        assert_eq!(profile.attributes["home_club_id"], json!(9));
        assert_eq!(find(&sensors, "member_id").state, EntityState::Value(42.into()));
        assert_eq!(
            find(&sensors, "home_club").state,
            EntityState::Value("Leeds (9)".into())
        );
    }

    #[test]
    fn next_payment_amount_in_pounds() {
        let sensors = sensors(&snapshot(), at(10, 0));
        let amount = find(&sensors, "next_payment_amount");
        assert_eq!(amount.unit, Some("GBP"));
        assert_eq!(amount.state, EntityState::Value(json!(24.5)));
        assert_eq!(amount.attributes["amount_formatted"], json!("£24.50"));
        assert_eq!(
            find(&sensors, "active_contract").state,
            EntityState::Value("Flex Monthly".into())
        );
    }

    #[test]
    fn failed_section_only_affects_its_sensors() {
        let mut s = snapshot();
        s.profile = Section::Unavailable("HTTP 500".into());
        let sensors = sensors(&s, at(10, 0));

        for key in ["profile", "member_id", "email", "home_club"] {
            assert_eq!(find(&sensors, key).state, EntityState::Unavailable, "{key}");
        }
        assert_eq!(find(&sensors, "count").state, EntityState::Value(3.into()));
        assert_eq!(
            find(&sensors, "active_contract").state,
            EntityState::Value("Flex Monthly".into())
        );
    }

    #[test]
    fn club_key_slugs_nameless_ids() {
        assert_eq!(club_key(&club(Some(0), "Old Trafford", 0)), "occupancy_old_trafford");
        assert_eq!(club_key(&club(Some(12), "X", 0)), "occupancy_12");
    }
}
