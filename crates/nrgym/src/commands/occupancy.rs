//! Occupancy command handler.

use tabled::Tabled;

use nrgym_api::{ClubOccupancy, Occupancy};
use nrgym_core::CoreError;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct ClubRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Club")]
    name: String,
    #[tabled(rename = "Members in club")]
    members: u32,
}

impl From<&ClubOccupancy> for ClubRow {
    fn from(c: &ClubOccupancy) -> Self {
        Self {
            id: util::opt_id(c.id),
            name: c.name.clone(),
            members: c.members,
        }
    }
}

fn detail(occupancy: &Occupancy) -> String {
    let table = output::render_list(
        &crate::cli::OutputFormat::Table,
        &occupancy.clubs,
        |c| ClubRow::from(c),
        |c| c.name.clone(),
    );
    format!("{table}\nTotal: {}", occupancy.total)
}

fn plain(occupancy: &Occupancy) -> String {
    occupancy
        .clubs
        .iter()
        .map(|c| format!("{}\t{}", c.name, c.members))
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let occupancy = super::with_portal(global, "Fetching club occupancy", |c| async move {
        c.client().get_occupancy().await.map_err(CoreError::from)
    })
    .await?;

    let out = output::render_single(&global.output, &occupancy, detail, plain);
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lists_clubs_with_counts() {
        let occupancy = Occupancy::from_clubs(vec![
            ClubOccupancy {
                id: Some(5),
                name: "Manchester".into(),
                members: 57,
            },
            ClubOccupancy {
                id: Some(9),
                name: "Leeds".into(),
                members: 21,
            },
        ]);
        assert_eq!(plain(&occupancy), "Manchester\t57\nLeeds\t21");
        assert!(detail(&occupancy).ends_with("Total: 78"));
    }
}
