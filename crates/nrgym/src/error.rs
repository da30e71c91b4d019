//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use nrgym_config::ConfigError;
use nrgym_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const CONFIG: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the gym portal at {url}")]
    #[diagnostic(
        code(nrgym::connection_failed),
        help(
            "Check your network connection and the portal URL.\n\
             URL: {url}\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(nrgym::auth_failed),
        help(
            "Verify your email and password.\n\
             Run: nrgym config set-password --profile <name>\n\
             Or set the NRG_PASSWORD environment variable."
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(nrgym::no_credentials),
        help(
            "Configure credentials with: nrgym config init\n\
             Or set NRG_EMAIL and NRG_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Portal ───────────────────────────────────────────────────────

    #[error("Portal error: {message}")]
    #[diagnostic(code(nrgym::api_error))]
    ApiError { message: String, status: Option<u16> },

    #[error("Sections unavailable after refresh: {sections}")]
    #[diagnostic(
        code(nrgym::unavailable),
        help("Re-run with -vv to see why each section failed.")
    )]
    Unavailable { sections: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(nrgym::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(nrgym::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: nrgym config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(nrgym::config),
        help("Check the config file printed by: nrgym config path")
    )]
    Config { message: String },

    // ── Timeout ──────────────────────────────────────────────────────

    #[error("The gym portal did not answer in time")]
    #[diagnostic(
        code(nrgym::timeout),
        help("Increase the timeout with --timeout or try again later.")
    )]
    Timeout,

    // ── IO / Internal ────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(nrgym::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            Self::ProfileNotFound { .. } | Self::Config { .. } => exit_code::CONFIG,
            Self::ApiError { .. } | Self::Unavailable { .. } | Self::Io(_) | Self::Internal(_) => {
                exit_code::GENERAL
            }
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Timeout => CliError::Timeout,
            CoreError::Api { message, status } => CliError::ApiError { message, status },
            CoreError::UnexpectedResponse { message } => CliError::ApiError {
                message,
                status: None,
            },
            CoreError::Config { message } => CliError::Config { message },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_exit_with_auth_code() {
        let err = CliError::from(CoreError::AuthenticationFailed {
            message: "bad password".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);

        let err = CliError::from(ConfigError::NoCredentials {
            profile: "default".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn transport_errors_keep_their_codes() {
        let err = CliError::from(CoreError::ConnectionFailed {
            url: "https://portal.example".into(),
            reason: "refused".into(),
        });
        assert_eq!(err.exit_code(), exit_code::CONNECTION);
        assert_eq!(CliError::from(CoreError::Timeout).exit_code(), exit_code::TIMEOUT);
    }

    #[test]
    fn config_errors_split_between_usage_and_config() {
        let err = CliError::from(ConfigError::Validation {
            field: "update_interval".into(),
            reason: "too small".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);

        let err = CliError::from(ConfigError::UnknownProfile {
            name: "work".into(),
        });
        assert_eq!(err.exit_code(), exit_code::CONFIG);
    }
}
