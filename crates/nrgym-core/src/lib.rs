//! Refresh coordination and host-facing entities for the NRG gym portal.
//!
//! - **[`Coordinator`]** owns the [`PortalClient`](nrgym_api::PortalClient),
//!   logs in, resolves the member's club, and runs the periodic refresh.
//!   Each refresh produces a fresh [`Snapshot`] published on a `watch`
//!   channel. [`Coordinator::oneshot()`] wraps connect/run/shutdown for
//!   single CLI invocations.
//!
//! - **Domain model** ([`model`]): the snapshot itself, where every data
//!   section is either [`Section::Available`] or [`Section::Unavailable`],
//!   plus the [`Entity`] and [`CalendarEvent`] types a host renders.
//!
//! - **Mapping** ([`convert`], [`calendar`]): pure functions from a
//!   snapshot to sensors, calendars and calendar events.

pub mod calendar;
pub mod config;
pub mod convert;
pub mod coordinator;
pub mod error;
pub mod model;

pub use config::{DEFAULT_UPDATE_INTERVAL, PortalConfig};
pub use coordinator::{ConnectionState, Coordinator};
pub use error::CoreError;
pub use model::{CalendarEvent, Entity, EntityKind, EntityState, Section, Snapshot};
