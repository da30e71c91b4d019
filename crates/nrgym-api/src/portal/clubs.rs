// Club occupancy endpoint

use serde_json::{Map, Value};
use tracing::debug;

use crate::endpoint::{Endpoint, MEMBERS_IN_CLUBS_HASH};
use crate::error::Error;
use crate::portal::client::{PortalCall, PortalClient};
use crate::portal::models::{ClubOccupancy, Occupancy, as_i64, first_text, first_value};

const LIST_KEYS: [&str; 5] = ["Clubs", "Items", "Data", "Result", "results"];
const NAME_KEYS: [&str; 4] = ["ClubName", "Name", "Club", "name"];
const COUNT_KEYS: [&str; 5] = [
    "UsersCountCurrentlyInClub",
    "MembersInClubCount",
    "Count",
    "members",
    "value",
];
const ID_KEYS: [&str; 3] = ["ClubId", "Id", "id"];

impl PortalClient {
    /// Current member counts per club.
    ///
    /// `POST Clubs/Clubs/GetMembersInClubs` with an empty body. The total is
    /// the sum of the per-club counts.
    pub async fn get_occupancy(&self) -> Result<Occupancy, Error> {
        let url = self.portal_url(Endpoint::MembersInClubs.path())?;
        let call = PortalCall::post_empty(url).with_hash(MEMBERS_IN_CLUBS_HASH);
        let payload = self.fetch_json(&call).await?;

        let clubs = extract_clubs(&payload).ok_or_else(|| Error::UnexpectedShape {
            endpoint: call.endpoint(),
            message: "no club list in occupancy payload".into(),
        })?;

        let occupancy = Occupancy::from_clubs(clubs.iter().filter_map(normalize_club).collect());
        debug!(
            clubs = occupancy.clubs.len(),
            total = occupancy.total,
            "fetched occupancy"
        );
        Ok(occupancy)
    }
}

/// Find the club entries in an occupancy payload.
///
/// `UsersInClubList` is the usual home; a generic list key takes precedence
/// when present. Some builds send an object keyed `"0"`, `"1"`, ... instead
/// of an array.
pub(crate) fn extract_clubs(payload: &Value) -> Option<Vec<Value>> {
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
    if let Some(items) = obj.get("UsersInClubList").and_then(Value::as_array) {
        return Some(items.clone());
    }

    let indexed = indexed_values(obj);
    (!indexed.is_empty()).then_some(indexed)
}

fn indexed_values(obj: &Map<String, Value>) -> Vec<Value> {
    (0..)
        .map_while(|i: usize| obj.get(&i.to_string()))
        .cloned()
        .collect()
}

fn normalize_club(item: &Value) -> Option<ClubOccupancy> {
    let obj = item.as_object()?;
    let members = COUNT_KEYS
        .iter()
        .filter_map(|key| obj.get(*key).and_then(as_i64))
        .find(|count| *count != 0)
        .map_or(0, |count| u32::try_from(count.max(0)).unwrap_or(u32::MAX));

    Some(ClubOccupancy {
        id: first_value(obj, &ID_KEYS).and_then(as_i64),
        name: first_text(obj, &NAME_KEYS).unwrap_or_else(|| "Club".into()),
        members,
    })
}
