// ── Host-facing entities ──
//
// A host (dashboard, home automation bridge, the CLI's `entities` command)
// sees the portal as a flat list of sensors and calendars. Each one has a
// stable key, a display name, and a state plus free-form attributes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Entity platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    Sensor,
    Calendar,
}

/// Current state of an entity.
///
/// `Unknown` means the data is there but has no value to show (no upcoming
/// booking, no active contract). `Unavailable` means the section the entity
/// reads from failed to refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum EntityState {
    Value(Value),
    Unknown,
    Unavailable,
}

impl EntityState {
    /// `Value` for `Some`, `Unknown` for `None`.
    pub fn from_option<T: Into<Value>>(value: Option<T>) -> Self {
        value.map_or(Self::Unknown, |v| Self::Value(v.into()))
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(Value::String(s)) => f.write_str(s),
            Self::Value(Value::Null) | Self::Unknown => f.write_str("unknown"),
            Self::Value(v) => write!(f, "{v}"),
            Self::Unavailable => f.write_str("unavailable"),
        }
    }
}

/// One sensor or calendar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub kind: EntityKind,
    /// Unique suffix, e.g. `next` or `occupancy_5`.
    pub key: String,
    pub name: String,
    pub icon: Option<&'static str>,
    pub unit: Option<&'static str>,
    pub state: EntityState,
    pub attributes: Map<String, Value>,
    pub entity_picture: Option<String>,
    /// Hosts should register the entity disabled when `false`.
    pub enabled_by_default: bool,
}

impl Entity {
    pub fn sensor(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Sensor,
            key: key.into(),
            name: name.into(),
            icon: None,
            unit: None,
            state: EntityState::Unknown,
            attributes: Map::new(),
            entity_picture: None,
            enabled_by_default: true,
        }
    }

    pub fn calendar(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Calendar,
            ..Self::sensor(key, name)
        }
    }

    /// Globally unique id for a host install, e.g.
    /// `nrgym_sensor_next_<entry>`.
    pub fn unique_id(&self, entry: &str) -> String {
        format!("nrgym_{}_{}_{entry}", self.kind, self.key)
    }

    #[must_use]
    pub fn icon(mut self, icon: &'static str) -> Self {
        self.icon = Some(icon);
        self
    }

    #[must_use]
    pub fn unit(mut self, unit: &'static str) -> Self {
        self.unit = Some(unit);
        self
    }

    #[must_use]
    pub fn state(mut self, state: EntityState) -> Self {
        self.state = state;
        self
    }

    #[must_use]
    pub fn attributes(mut self, attributes: Map<String, Value>) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn disabled_by_default(mut self) -> Self {
        self.enabled_by_default = false;
        self
    }

    /// Mark unavailable and drop attributes, as hosts show nothing else for
    /// an unavailable entity.
    #[must_use]
    pub fn unavailable(mut self) -> Self {
        self.state = EntityState::Unavailable;
        self.attributes.clear();
        self.entity_picture = None;
        self
    }
}

/// One calendar entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    pub summary: String,
    pub start: DateTime<Utc>,
    /// Equal to `start` for point-in-time events.
    pub end: DateTime<Utc>,
    pub location: Option<String>,
    pub description: Option<String>,
}
