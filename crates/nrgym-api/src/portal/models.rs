// Portal response types
//
// Wire structs for the endpoints with a stable shape, plus the normalized
// records the client hands back. Fields use `#[serde(default)]` liberally
// because the portal omits anything a member has not filled in, and numeric
// ids occasionally arrive as strings.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ── Lenient JSON helpers ────────────────────────────────────────────

/// Epoch values above this are milliseconds, below it seconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 10_000_000_000;

/// Falsy in the loose sense the portal's web app uses: null, `false`, `0`,
/// `""`, `[]`, `{}`.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// First truthy value among `keys`.
pub(crate) fn first_value<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| truthy(value))
}

/// Render a scalar as text; objects and arrays have no text form here.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// First truthy scalar among `keys`, as text.
pub(crate) fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    first_value(obj, keys).and_then(scalar_text)
}

/// Integer from a JSON number or numeric string.
pub(crate) fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(truncate)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Float from a JSON number or numeric string.
pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn truncate(f: f64) -> i64 {
    f.trunc() as i64
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(as_i64))
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(as_f64))
}

/// Parse a portal timestamp.
///
/// Accepts ISO-8601 with `Z` or an offset, naive ISO date-times and dates
/// (taken as UTC), and epoch numbers or numeric strings (seconds, or
/// milliseconds when larger than 10^10).
pub fn parse_portal_datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            parse_iso(s).or_else(|| s.parse::<i64>().ok().and_then(from_epoch))
        }
        Value::Number(_) => as_i64(value).and_then(from_epoch),
        _ => None,
    }
}

fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn from_epoch(raw: i64) -> Option<DateTime<Utc>> {
    if raw > EPOCH_MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(raw)
    } else {
        DateTime::from_timestamp(raw, 0)
    }
}

fn portal_datetime<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(parse_portal_datetime))
}

// ── Bookings ────────────────────────────────────────────────────────

/// One upcoming (or recent) class booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub summary: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub description: Option<String>,
}

// ── Occupancy ───────────────────────────────────────────────────────

/// Members currently checked in at one club.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubOccupancy {
    pub id: Option<i64>,
    pub name: String,
    pub members: u32,
}

/// Occupancy across every club; `total` is the sum of the per-club counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupancy {
    pub clubs: Vec<ClubOccupancy>,
    pub total: u64,
}

impl Occupancy {
    pub fn from_clubs(clubs: Vec<ClubOccupancy>) -> Self {
        let total = clubs.iter().map(|c| u64::from(c.members)).sum();
        Self { clubs, total }
    }
}

// ── Identity ────────────────────────────────────────────────────────

/// `POST Auth/Login/Identity` → `{ "Member": { ... } }`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct IdentityResponse {
    #[serde(default)]
    pub member: Option<RawMember>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RawMember {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub id: Option<i64>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub home_club_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub default_club_id: Option<i64>,
    #[serde(default, rename = "Type")]
    pub member_type: Option<Value>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// Who the session belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub home_club_id: Option<i64>,
    pub default_club_id: Option<i64>,
    pub member_type: Option<String>,
    pub photo_url: Option<String>,
}

impl From<RawMember> for Identity {
    fn from(m: RawMember) -> Self {
        Self {
            user_id: m.id,
            first_name: m.first_name,
            last_name: m.last_name,
            email: m.email,
            home_club_id: m.home_club_id,
            default_club_id: m.default_club_id,
            member_type: m.member_type.as_ref().and_then(scalar_text),
            photo_url: m.photo_url,
        }
    }
}

// ── Profile ─────────────────────────────────────────────────────────

/// `POST Profile/Profile/GetProfileForEdit` → `{ "Model": { ... } }`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ProfileResponse {
    #[serde(default)]
    pub model: Option<RawProfileModel>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RawProfileModel {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub personal_data: Option<RawPersonalData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RawPersonalData {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<RawPhone>,
    #[serde(default)]
    pub referral_code: Option<String>,
    #[serde(default)]
    pub photo: Option<RawPhoto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RawPhone {
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RawPhoto {
    #[serde(default)]
    pub url: Option<String>,
}

/// `GET Products/ChooseProducts/GetProductsForUser` → `{ "ClubName": ... }`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ProductsResponse {
    #[serde(default)]
    pub club_name: Option<String>,
}

/// Member profile as shown in the portal's profile editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub referral_code: Option<String>,
    pub photo_url: Option<String>,
    pub club_name: Option<String>,
}

impl Profile {
    /// Build from the wire model; `requested_id` fills in a missing `UserId`.
    pub(crate) fn from_model(model: RawProfileModel, requested_id: Option<i64>) -> Self {
        let pd = model.personal_data.unwrap_or_default();
        let full_name = [pd.first_name.as_deref(), pd.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            user_id: model.user_id.or(requested_id),
            full_name: (!full_name.is_empty()).then_some(full_name),
            first_name: pd.first_name,
            last_name: pd.last_name,
            email: pd.email,
            phone: pd.phone.and_then(|p| p.phone_number),
            referral_code: pd.referral_code,
            photo_url: pd.photo.and_then(|p| p.url),
            club_name: None,
        }
    }
}

// ── Contracts ───────────────────────────────────────────────────────

/// `POST Profile/Contracts/ContractList` → `{ "Contracts": [ ... ] }`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ContractListResponse {
    #[serde(default)]
    pub contracts: Option<Vec<RawContract>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RawContract {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub addons_names: Option<Vec<String>>,
    #[serde(default)]
    pub club: Option<RawContractClub>,
    #[serde(default)]
    pub cost: Option<RawCost>,
    #[serde(default, deserialize_with = "portal_datetime")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "portal_datetime")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "portal_datetime")]
    pub commitment_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "portal_datetime")]
    pub next_payment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_interval: Option<Value>,
    #[serde(default)]
    pub commitment_period: Option<Value>,
    #[serde(default)]
    pub short_description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RawContractClub {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RawCost {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub gross: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub net: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub tax: Option<f64>,
}

/// One membership contract.
///
/// `payment_interval` and `commitment_period` are passed through untouched:
/// the portal sends them as either labels or small objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub addons: Vec<String>,
    pub club_id: Option<i64>,
    pub club_name: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub commitment_date: Option<DateTime<Utc>>,
    pub next_payment_date: Option<DateTime<Utc>>,
    pub payment_interval: Option<Value>,
    pub commitment_period: Option<Value>,
    pub cost_gross: Option<f64>,
    pub cost_net: Option<f64>,
    pub cost_tax: Option<f64>,
    pub short_description: Option<String>,
}

impl From<RawContract> for Contract {
    fn from(c: RawContract) -> Self {
        let club = c.club.unwrap_or_default();
        let cost = c.cost.unwrap_or_default();
        Self {
            id: c.id,
            name: c.name,
            addons: c.addons_names.unwrap_or_default(),
            club_id: club.id,
            club_name: club.name,
            start_date: c.start_date,
            end_date: c.end_date,
            commitment_date: c.commitment_date,
            next_payment_date: c.next_payment_date,
            payment_interval: c.payment_interval,
            commitment_period: c.commitment_period,
            cost_gross: cost.gross,
            cost_net: cost.net,
            cost_tax: cost.tax,
            short_description: c.short_description,
        }
    }
}

/// All contracts plus the active one (the first listed).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contracts {
    pub contracts: Vec<Contract>,
    pub active: Option<Contract>,
}

impl Contracts {
    pub fn new(contracts: Vec<Contract>) -> Self {
        let active = contracts.first().cloned();
        Self { contracts, active }
    }

    /// Next-payment fields derived from the active contract.
    pub fn next_payment(&self) -> Option<NextPayment> {
        let active = self.active.as_ref()?;
        Some(NextPayment {
            contract: active.name.clone(),
            club_name: active.club_name.clone(),
            date: active.next_payment_date,
            amount: active.cost_gross,
            commitment_period: active.commitment_period.clone(),
        })
    }
}

/// The upcoming membership payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextPayment {
    pub contract: Option<String>,
    pub club_name: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub amount: Option<f64>,
    pub commitment_period: Option<Value>,
}

impl NextPayment {
    /// Amount as pounds with two decimals, e.g. `£24.99`.
    pub fn amount_formatted(&self) -> Option<String> {
        self.amount.map(|a| format!("£{a:.2}"))
    }
}
