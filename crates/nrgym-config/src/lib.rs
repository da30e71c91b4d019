//! Configuration for the nrgym CLI.
//!
//! TOML profiles, update-interval validation, credential resolution
//! (env + keyring + plaintext), and translation to
//! `nrgym_core::PortalConfig`. The CLI layers its global flags on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use nrgym_api::{Credentials, DEFAULT_BASE_URL};
use nrgym_core::PortalConfig;

/// Keyring service name; entries are keyed `<profile>/password`.
pub const KEYRING_SERVICE: &str = "nrgym";

/// Environment variable consulted before the keyring.
pub const PASSWORD_ENV: &str = "NRG_PASSWORD";

/// Environment variable used when a profile has no email.
pub const EMAIL_ENV: &str = "NRG_EMAIL";

/// Default refresh cadence, in seconds.
pub const DEFAULT_UPDATE_INTERVAL_SECS: i64 = 3600;

/// Shortest refresh cadence the portal should be polled at, in seconds.
pub const MIN_UPDATE_INTERVAL_SECS: i64 = 300;

/// Default per-request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Refresh interval in seconds for `watch`.
    #[serde(default = "default_update_interval")]
    pub update_interval: i64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            update_interval: default_update_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_update_interval() -> i64 {
    DEFAULT_UPDATE_INTERVAL_SECS
}

/// A named portal account.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Login email.
    pub email: Option<String>,

    /// Password (plaintext; prefer keyring or `NRG_PASSWORD`).
    pub password: Option<String>,

    /// Portal root URL; defaults to the NRG portal.
    pub portal_url: Option<String>,

    /// Club used for the bookings calendar.
    pub club_id: Option<i64>,

    /// Member id for profile and contract calls.
    pub user_id: Option<i64>,

    /// Bookings endpoint tried before the built-in ones.
    pub bookings_path: Option<String>,

    /// Override the refresh interval (seconds).
    pub update_interval: Option<i64>,

    /// Override the request timeout (seconds).
    pub timeout: Option<u64>,
}

// ── Validation ──────────────────────────────────────────────────────

/// Turn a configured interval into a refresh period.
///
/// Non-positive values mean "use the default"; anything below
/// [`MIN_UPDATE_INTERVAL_SECS`] is rejected.
pub fn validate_update_interval(secs: i64) -> Result<Duration, ConfigError> {
    if secs <= 0 {
        return Ok(Duration::from_secs(DEFAULT_UPDATE_INTERVAL_SECS.unsigned_abs()));
    }
    if secs < MIN_UPDATE_INTERVAL_SECS {
        return Err(ConfigError::Validation {
            field: "update_interval".into(),
            reason: format!("must be at least {MIN_UPDATE_INTERVAL_SECS} seconds, got {secs}"),
        });
    }
    Ok(Duration::from_secs(secs.unsigned_abs()))
}

/// Parse a portal URL, defaulting to the NRG portal.
pub fn parse_portal_url(raw: Option<&str>) -> Result<url::Url, ConfigError> {
    let raw = raw.unwrap_or(DEFAULT_BASE_URL);
    raw.parse().map_err(|_| ConfigError::Validation {
        field: "portal_url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "nrgym", "nrgym").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("nrgym");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load Config from `path`, layered over defaults and under `NRGYM_*`
/// environment variables (`NRGYM_DEFAULTS__TIMEOUT=30`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NRGYM_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/password"),
    )?)
}

/// Resolve the login email: profile, then `NRG_EMAIL`.
pub fn resolve_email(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .email
        .clone()
        .filter(|e| !e.trim().is_empty())
        .or_else(|| std::env::var(EMAIL_ENV).ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Resolve the password: `NRG_PASSWORD`, then the keyring, then the
/// plaintext value in the profile.
pub fn resolve_password(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    // 1. Env var
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    // 2. Keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password)?;
    Ok(())
}

/// Build a `PortalConfig` from a profile, with no CLI flag overrides.
pub fn profile_to_portal_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<PortalConfig, ConfigError> {
    let url = parse_portal_url(profile.portal_url.as_deref())?;
    let credentials = Credentials::new(
        resolve_email(profile, profile_name)?,
        resolve_password(profile, profile_name)?,
    );

    let mut config = PortalConfig::new(url, credentials);
    config.club_id = profile.club_id;
    config.user_id = profile.user_id;
    config.bookings_path = profile
        .bookings_path
        .clone()
        .filter(|p| !p.trim().is_empty());
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.update_interval =
        validate_update_interval(profile.update_interval.unwrap_or(defaults.update_interval))?;
    Ok(config)
}
