//! Config subcommand handlers.

use dialoguer::{Input, Password, Select};
use serde_json::Value;

use nrgym_api::DEFAULT_BASE_URL;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util::{self, prompt_err};

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "update_interval = {}", cfg.defaults.update_interval);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        if let Some(ref email) = p.email {
            let _ = writeln!(out, "email = \"{email}\"");
        }
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if let Some(ref url) = p.portal_url {
            let _ = writeln!(out, "portal_url = \"{url}\"");
        }
        if let Some(club) = p.club_id {
            let _ = writeln!(out, "club_id = {club}");
        }
        if let Some(user) = p.user_id {
            let _ = writeln!(out, "user_id = {user}");
        }
        if let Some(ref path) = p.bookings_path {
            let _ = writeln!(out, "bookings_path = \"{path}\"");
        }
        if let Some(interval) = p.update_interval {
            let _ = writeln!(out, "update_interval = {interval}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out
}

/// Structured form of the config with every `password` masked.
fn redacted_value(cfg: &Config) -> Result<Value, CliError> {
    let mut value = serde_json::to_value(cfg).map_err(|e| CliError::Internal(e.to_string()))?;
    if let Some(profiles) = value.get_mut("profiles").and_then(Value::as_object_mut) {
        for profile in profiles.values_mut() {
            if let Some(pw) = profile.get_mut("password") {
                if !pw.is_null() {
                    *pw = Value::String("****".into());
                }
            }
        }
    }
    Ok(value)
}

/// Optional integer prompt; blank input means "not set".
fn prompt_optional_id(prompt: &str) -> Result<Option<i64>, CliError> {
    let raw: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .validate_with(|s: &String| -> Result<(), &str> {
            if s.trim().is_empty() || s.trim().parse::<i64>().is_ok() {
                Ok(())
            } else {
                Err("enter a number or leave blank")
            }
        })
        .interact_text()
        .map_err(prompt_err)?;
    Ok(raw.trim().parse().ok())
}

/// Ask where to keep the password. Returns `Some` for plaintext config.
fn prompt_password_storage(profile_name: &str, password: &str) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        config::store_password(profile_name, password)?;
        eprintln!("   ✓ Password stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(password.to_owned()))
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => format_config_redacted(&cfg),
                _ => {
                    let value = redacted_value(&cfg)?;
                    output::render_single(&global.output, &value, |_| String::new(), |_| {
                        String::new()
                    })
                }
            };
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::SetPassword { profile } => {
            let cfg = config::load_config_or_default();
            let name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            let password = Password::new()
                .with_prompt(format!("Password for profile '{name}'"))
                .with_confirmation("Confirm password", "Passwords do not match")
                .interact()
                .map_err(prompt_err)?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }
            config::store_password(&name, &password)?;
            if !global.quiet {
                eprintln!("Password stored in system keyring for profile '{name}'");
            }
            Ok(())
        }
    }
}

/// Interactive wizard: create or replace one profile.
fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("NRG gym portal -- configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let mut cfg = config::load_config_or_default();

    // 1. Profile name
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default(global.profile.clone().unwrap_or_else(|| "default".into()))
        .interact_text()
        .map_err(prompt_err)?;

    if cfg.profiles.contains_key(&profile_name)
        && !util::confirm(&format!("Profile '{profile_name}' exists. Replace it?"))?
    {
        return Ok(());
    }

    // 2. Credentials
    let email: String = Input::new()
        .with_prompt("Login email")
        .validate_with(|s: &String| -> Result<(), &str> {
            if s.contains('@') {
                Ok(())
            } else {
                Err("not an email address")
            }
        })
        .interact_text()
        .map_err(prompt_err)?;
    let password = Password::new()
        .with_prompt("Password")
        .interact()
        .map_err(prompt_err)?;
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    let password = prompt_password_storage(&profile_name, &password)?;

    // 3. Portal and member details
    let portal_url: String = Input::new()
        .with_prompt("Portal URL")
        .default(DEFAULT_BASE_URL.into())
        .interact_text()
        .map_err(prompt_err)?;
    config::parse_portal_url(Some(&portal_url))?;

    let club_id = prompt_optional_id("Club ID for bookings (blank = your home club)")?;
    let user_id = prompt_optional_id("Member ID (blank = detect at login)")?;

    // 4. Refresh interval
    let update_interval: i64 = Input::new()
        .with_prompt("Refresh interval in seconds")
        .default(cfg.defaults.update_interval)
        .interact_text()
        .map_err(prompt_err)?;
    config::validate_update_interval(update_interval)?;

    let profile = Profile {
        email: Some(email),
        password,
        portal_url: (portal_url != DEFAULT_BASE_URL).then_some(portal_url),
        club_id,
        user_id,
        update_interval: (update_interval != cfg.defaults.update_interval)
            .then_some(update_interval),
        ..Profile::default()
    };

    cfg.profiles.insert(profile_name.clone(), profile);
    if cfg.profiles.len() == 1 || cfg.default_profile.is_none() {
        cfg.default_profile = Some(profile_name.clone());
    }
    config::save_config(&cfg)?;

    eprintln!("\n   ✓ Profile '{profile_name}' saved to {}", config_path.display());
    eprintln!("   Try: nrgym --profile {profile_name} login");
    Ok(())
}
