//! Command dispatch: bridges CLI args -> coordinator calls -> output formatting.

pub mod account;
pub mod bookings;
pub mod config_cmd;
pub mod entities;
pub mod occupancy;
pub mod util;

use std::future::Future;

use nrgym_core::{Coordinator, CoreError};

use crate::cli::{Command, GlobalOpts};
use crate::config;
use crate::error::CliError;

/// Dispatch a portal-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Login => account::login(global).await,
        Command::Bookings(args) => bookings::handle(args, global).await,
        Command::Occupancy => occupancy::handle(global).await,
        Command::Identity => account::identity(global).await,
        Command::Profile => account::profile(global).await,
        Command::Contracts => account::contracts(global).await,
        Command::Check => entities::check(global).await,
        Command::Entities(args) => entities::list(args, global).await,
        Command::Watch(args) => entities::watch(args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "local command routed to portal dispatch".into(),
        )),
    }
}

/// Resolve the portal config, log in, run `f`, and log out again, with a
/// spinner while it runs.
pub async fn with_portal<T, F, Fut>(global: &GlobalOpts, message: &str, f: F) -> Result<T, CliError>
where
    F: FnOnce(Coordinator) -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let portal = config::resolve_portal_config(global)?;
    let bar = util::spinner(message, global.quiet);
    let result = Coordinator::oneshot(portal, f).await;
    util::finish(bar);
    Ok(result?)
}
