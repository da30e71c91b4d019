// ── Domain model ──
//
// The refresh snapshot and the host-facing entity types built from it.

pub mod entity;
pub mod section;
pub mod snapshot;

pub use entity::{CalendarEvent, Entity, EntityKind, EntityState};
pub use section::Section;
pub use snapshot::Snapshot;
