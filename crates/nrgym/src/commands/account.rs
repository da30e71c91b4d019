//! Member account handlers: login, identity, profile, contracts.

use serde::Serialize;
use tabled::Tabled;

use nrgym_api::{Contract, Contracts, Identity, NextPayment, Profile};
use nrgym_core::CoreError;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Login ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct LoginSummary {
    #[serde(flatten)]
    identity: Identity,
    /// Club the bookings calendar will use.
    club_id: i64,
}

pub async fn login(global: &GlobalOpts) -> Result<(), CliError> {
    let summary = super::with_portal(global, "Logging in", |c| async move {
        let identity = c.client().get_identity().await.map_err(CoreError::from)?;
        Ok(LoginSummary {
            identity,
            club_id: c.club_id(),
        })
    })
    .await?;

    if !global.quiet {
        let who = util::join_name(
            summary.identity.first_name.as_deref(),
            summary.identity.last_name.as_deref(),
        );
        eprintln!(
            "Logged in as {}",
            if who.is_empty() { "member" } else { who.as_str() }
        );
    }

    let out = output::render_single(
        &global.output,
        &summary,
        |s| {
            output::detail_lines(&[
                ("Member ID", util::opt_id(s.identity.user_id)),
                ("Email", s.identity.email.clone().unwrap_or_default()),
                ("Bookings club", s.club_id.to_string()),
            ])
        },
        |s| util::opt_id(s.identity.user_id),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Identity ────────────────────────────────────────────────────────

fn identity_detail(i: &Identity) -> String {
    output::detail_lines(&[
        (
            "Name",
            util::join_name(i.first_name.as_deref(), i.last_name.as_deref()),
        ),
        ("Member ID", util::opt_id(i.user_id)),
        ("Email", i.email.clone().unwrap_or_default()),
        ("Home club", util::opt_id(i.home_club_id)),
        ("Default club", util::opt_id(i.default_club_id)),
        ("Member type", i.member_type.clone().unwrap_or_default()),
        ("Photo", i.photo_url.clone().unwrap_or_default()),
    ])
}

pub async fn identity(global: &GlobalOpts) -> Result<(), CliError> {
    let identity = super::with_portal(global, "Fetching identity", |c| async move {
        c.client().get_identity().await.map_err(CoreError::from)
    })
    .await?;

    let out = output::render_single(&global.output, &identity, identity_detail, |i| {
        util::opt_id(i.user_id)
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Profile ─────────────────────────────────────────────────────────

fn profile_detail(p: &Profile) -> String {
    let name = p
        .full_name
        .clone()
        .unwrap_or_else(|| util::join_name(p.first_name.as_deref(), p.last_name.as_deref()));
    output::detail_lines(&[
        ("Name", name),
        ("Member ID", util::opt_id(p.user_id)),
        ("Email", p.email.clone().unwrap_or_default()),
        ("Phone", p.phone.clone().unwrap_or_default()),
        ("Home club", p.club_name.clone().unwrap_or_default()),
        ("Referral code", p.referral_code.clone().unwrap_or_default()),
        ("Photo", p.photo_url.clone().unwrap_or_default()),
    ])
}

pub async fn profile(global: &GlobalOpts) -> Result<(), CliError> {
    let profile = super::with_portal(global, "Fetching profile", |c| async move {
        let user_id = c.config().user_id;
        c.client()
            .get_profile(user_id)
            .await
            .map_err(CoreError::from)
    })
    .await?;

    let out = output::render_single(&global.output, &profile, profile_detail, |p| {
        util::opt_id(p.user_id)
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Contracts ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ContractRow {
    #[tabled(rename = "")]
    active: &'static str,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Contract")]
    name: String,
    #[tabled(rename = "Club")]
    club: String,
    #[tabled(rename = "Started")]
    start: String,
    #[tabled(rename = "Next payment")]
    next_payment: String,
    #[tabled(rename = "Gross")]
    gross: String,
}

fn contract_row(c: &Contract, active: Option<&Contract>) -> ContractRow {
    ContractRow {
        active: if active == Some(c) { "*" } else { "" },
        id: util::opt_id(c.id),
        name: c.name.clone().unwrap_or_default(),
        club: c.club_name.clone().unwrap_or_default(),
        start: c
            .start_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        next_payment: c
            .next_payment_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        gross: c.cost_gross.map(|v| format!("£{v:.2}")).unwrap_or_default(),
    }
}

#[derive(Serialize)]
struct ContractsView {
    #[serde(flatten)]
    contracts: Contracts,
    next_payment: Option<NextPayment>,
}

fn contracts_detail(view: &ContractsView) -> String {
    if view.contracts.contracts.is_empty() {
        return "No contracts found".into();
    }
    let active = view.contracts.active.as_ref();
    let table = output::render_list(
        &OutputFormat::Table,
        &view.contracts.contracts,
        |c| contract_row(c, active),
        |_| String::new(),
    );

    match view.next_payment {
        Some(ref payment) => {
            let amount = payment.amount_formatted().unwrap_or_else(|| "unknown amount".into());
            let date = payment
                .date
                .map_or_else(|| "an unknown date".into(), |d| d.format("%Y-%m-%d").to_string());
            format!("{table}\nNext payment: {amount} on {date}")
        }
        None => table,
    }
}

pub async fn contracts(global: &GlobalOpts) -> Result<(), CliError> {
    let contracts = super::with_portal(global, "Fetching contracts", |c| async move {
        let user_id = c.config().user_id;
        c.client()
            .get_contracts(user_id)
            .await
            .map_err(CoreError::from)
    })
    .await?;

    let view = ContractsView {
        next_payment: contracts.next_payment(),
        contracts,
    };
    let out = output::render_single(&global.output, &view, contracts_detail, |v| {
        v.contracts
            .contracts
            .iter()
            .filter_map(|c| c.name.clone())
            .collect::<Vec<_>>()
            .join("\n")
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_contract_is_marked() {
        let gold = Contract {
            id: Some(1),
            name: Some("Gold".into()),
            cost_gross: Some(24.99),
            ..Contract::default()
        };
        let old = Contract {
            id: Some(2),
            name: Some("Off-peak".into()),
            ..Contract::default()
        };

        let row = contract_row(&gold, Some(&gold));
        assert_eq!(row.active, "*");
        assert_eq!(row.gross, "£24.99");
        assert_eq!(contract_row(&old, Some(&gold)).active, "");
    }

    #[test]
    fn empty_contracts_say_so() {
        let view = ContractsView {
            contracts: Contracts::default(),
            next_payment: None,
        };
        assert_eq!(contracts_detail(&view), "No contracts found");
    }
}
