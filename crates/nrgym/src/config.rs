//! CLI configuration -- thin wrapper around `nrgym_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--email, --club-id, etc.).

use std::time::Duration;

use nrgym_core::PortalConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use nrgym_config::{
    Config, Profile, config_path, load_config, load_config_or_default, parse_portal_url,
    save_config, store_password, validate_update_interval,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Apply global flag overrides on top of a stored profile.
pub fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref email) = global.email {
        profile.email = Some(email.clone());
    }
    if let Some(ref url) = global.portal_url {
        profile.portal_url = Some(url.clone());
    }
    if global.club_id.is_some() {
        profile.club_id = global.club_id;
    }
    if global.user_id.is_some() {
        profile.user_id = global.user_id;
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }
    profile
}

/// Build a `PortalConfig` from the config file, the active profile, and CLI
/// overrides.
///
/// An explicitly named profile must exist. The implicit default profile may
/// be missing, in which case flags and `NRG_*` variables supply everything.
pub fn resolve_portal_config(global: &GlobalOpts) -> Result<PortalConfig, CliError> {
    let cfg = load_config_or_default();
    let name = active_profile_name(global, &cfg);

    let stored = match cfg.profiles.get(&name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
            available.sort();
            return Err(CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        None => Profile::default(),
    };

    let profile = apply_overrides(stored, global);
    let mut portal = nrgym_config::profile_to_portal_config(&profile, &name, &cfg.defaults)?;
    if let Some(secs) = global.timeout {
        portal.timeout = Duration::from_secs(secs);
    }
    tracing::debug!(profile = %name, url = %portal.url, "resolved portal config");
    Ok(portal)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["nrgym"];
        argv.extend_from_slice(args);
        argv.push("login");
        Cli::parse_from(argv).global
    }

    #[test]
    fn flags_override_profile_values() {
        let stored = Profile {
            email: Some("old@example.com".into()),
            club_id: Some(5),
            timeout: Some(10),
            ..Profile::default()
        };
        let global = global(&["--email", "new@example.com", "--club-id", "9"]);

        let profile = apply_overrides(stored, &global);

        assert_eq!(profile.email.as_deref(), Some("new@example.com"));
        assert_eq!(profile.club_id, Some(9));
        assert_eq!(profile.timeout, Some(10));
        assert_eq!(profile.user_id, None);
    }

    #[test]
    fn profile_flag_wins_over_default_profile() {
        let cfg = Config {
            default_profile: Some("home".into()),
            ..Config::default()
        };
        assert_eq!(active_profile_name(&global(&[]), &cfg), "home");
        assert_eq!(
            active_profile_name(&global(&["--profile", "work"]), &cfg),
            "work"
        );
    }
}
