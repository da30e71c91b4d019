// ── Refresh snapshot ──

use chrono::{DateTime, Utc};
use nrgym_api::{Booking, Contracts, Identity, Occupancy, Profile};
use serde::Serialize;

use super::section::Section;

/// Everything fetched in one refresh cycle.
///
/// Replaced wholesale on every refresh; nothing is merged across cycles.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// When the refresh finished. `None` until the first refresh.
    pub refreshed_at: Option<DateTime<Utc>>,
    /// Club the bookings calendar was fetched for.
    pub club_id: i64,
    pub bookings: Section<Vec<Booking>>,
    pub occupancy: Section<Occupancy>,
    pub identity: Section<Identity>,
    pub profile: Section<Profile>,
    pub contracts: Section<Contracts>,
}

impl Snapshot {
    /// The placeholder published before the first refresh.
    pub fn empty(club_id: i64) -> Self {
        Self {
            refreshed_at: None,
            club_id,
            bookings: Section::pending(),
            occupancy: Section::pending(),
            identity: Section::pending(),
            profile: Section::pending(),
            contracts: Section::pending(),
        }
    }

    /// Names of the sections that failed in this refresh.
    pub fn unavailable_sections(&self) -> Vec<&'static str> {
        [
            ("bookings", self.bookings.is_available()),
            ("occupancy", self.occupancy.is_available()),
            ("identity", self.identity.is_available()),
            ("profile", self.profile.is_available()),
            ("contracts", self.contracts.is_available()),
        ]
        .into_iter()
        .filter_map(|(name, ok)| (!ok).then_some(name))
        .collect()
    }
}
