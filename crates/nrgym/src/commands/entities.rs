//! Snapshot-level handlers: check, entities, watch.

use chrono::Utc;
use serde::Serialize;
use tabled::Tabled;

use nrgym_core::{Coordinator, Entity, Section, Snapshot, convert};

use crate::cli::{EntitiesArgs, GlobalOpts, OutputFormat, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Entities ────────────────────────────────────────────────────────

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Unit")]
    unit: String,
}

fn entity_row(e: &Entity, color: bool) -> EntityRow {
    EntityRow {
        kind: e.kind.to_string(),
        key: e.key.clone(),
        name: e.name.clone(),
        state: output::state_cell(&e.state, color),
        unit: e.unit.unwrap_or_default().to_owned(),
    }
}

/// Entities for a snapshot; disabled-by-default ones only with `all`.
fn visible_entities(snapshot: &Snapshot, all: bool) -> Vec<Entity> {
    convert::entities(snapshot, Utc::now())
        .into_iter()
        .filter(|e| all || e.enabled_by_default)
        .collect()
}

fn render_entities(entities: &[Entity], global: &GlobalOpts) -> String {
    let color = output::should_color(&global.color);
    output::render_list(
        &global.output,
        entities,
        |e| entity_row(e, color),
        |e| format!("{}={}", e.key, e.state),
    )
}

pub async fn list(args: EntitiesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let snapshot = super::with_portal(global, "Refreshing", |c| async move {
        Ok(c.refresh().await)
    })
    .await?;

    let entities = visible_entities(&snapshot, args.all);
    output::print_output(&render_entities(&entities, global), global.quiet);
    Ok(())
}

// ── Check ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Tabled)]
struct SectionStatus {
    #[tabled(rename = "Section")]
    section: &'static str,
    #[tabled(rename = "Available")]
    available: bool,
    #[tabled(rename = "Detail")]
    detail: String,
}

fn status<T>(
    section: &'static str,
    data: &Section<T>,
    summary: impl Fn(&T) -> String,
) -> SectionStatus {
    match data {
        Section::Available(value) => SectionStatus {
            section,
            available: true,
            detail: summary(value),
        },
        Section::Unavailable(reason) => SectionStatus {
            section,
            available: false,
            detail: reason.clone(),
        },
    }
}

fn section_statuses(snapshot: &Snapshot) -> Vec<SectionStatus> {
    vec![
        status("bookings", &snapshot.bookings, |b| {
            format!("{} booking(s) at club {}", b.len(), snapshot.club_id)
        }),
        status("occupancy", &snapshot.occupancy, |o| {
            format!("{} member(s) across {} club(s)", o.total, o.clubs.len())
        }),
        status("identity", &snapshot.identity, |i| {
            format!("member {}", util::opt_id(i.user_id))
        }),
        status("profile", &snapshot.profile, |p| {
            p.email.clone().unwrap_or_default()
        }),
        status("contracts", &snapshot.contracts, |c| {
            format!("{} contract(s)", c.contracts.len())
        }),
    ]
}

pub async fn check(global: &GlobalOpts) -> Result<(), CliError> {
    let snapshot = super::with_portal(global, "Running a full refresh", |c| async move {
        Ok(c.refresh().await)
    })
    .await?;

    let statuses = section_statuses(&snapshot);
    let out = output::render_list(
        &global.output,
        &statuses,
        |s| SectionStatus {
            section: s.section,
            available: s.available,
            detail: s.detail.clone(),
        },
        |s| format!("{}\t{}", s.section, if s.available { "ok" } else { "unavailable" }),
    );
    output::print_output(&out, global.quiet);

    let failed = snapshot.unavailable_sections();
    if failed.is_empty() {
        Ok(())
    } else {
        Err(CliError::Unavailable {
            sections: failed.join(", "),
        })
    }
}

// ── Watch ───────────────────────────────────────────────────────────

fn print_refresh(snapshot: &Snapshot, all: bool, global: &GlobalOpts) {
    if !global.quiet && matches!(global.output, OutputFormat::Table) {
        if let Some(at) = snapshot.refreshed_at {
            eprintln!("Refreshed {}", output::local_time(&at));
        }
    }
    let entities = visible_entities(snapshot, all);
    output::print_output(&render_entities(&entities, global), global.quiet);
}

pub async fn watch(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut portal = config::resolve_portal_config(global)?;
    if let Some(secs) = args.interval {
        portal.update_interval = config::validate_update_interval(secs)?;
    }

    let coordinator = Coordinator::new(portal)?;
    coordinator.connect().await?;
    if !global.quiet {
        eprintln!(
            "Watching club {} every {}s (Ctrl-C to stop)",
            coordinator.club_id(),
            coordinator.config().update_interval.as_secs()
        );
    }

    let mut updates = coordinator.subscribe();
    coordinator.start().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                print_refresh(&snapshot, args.all, global);
            }
        }
    }

    coordinator.shutdown().await;
    Ok(())
}
