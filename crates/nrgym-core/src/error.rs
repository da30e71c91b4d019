// ── Core error types ──
//
// User-facing errors from nrgym-core. Consumers never see reqwest or serde
// failures directly; the `From<nrgym_api::Error>` impl folds them into
// the handful of cases a person can act on.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the gym portal at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("The gym portal did not answer in time")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Portal error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Unexpected portal response: {message}")]
    UnexpectedResponse { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether this error means the credentials or session were rejected.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<nrgym_api::Error> for CoreError {
    fn from(err: nrgym_api::Error) -> Self {
        let timed_out = err.is_timeout();
        let unreachable = err.is_connect();
        match err {
            nrgym_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            nrgym_api::Error::SessionExpired => CoreError::AuthenticationFailed {
                message: "Session expired -- the portal rejected a fresh login".into(),
            },
            nrgym_api::Error::Transport(_) if timed_out => CoreError::Timeout,
            nrgym_api::Error::Transport(ref e) if unreachable => CoreError::ConnectionFailed {
                url: e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string),
                reason: e.to_string(),
            },
            nrgym_api::Error::Transport(ref e) => CoreError::Api {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            nrgym_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            nrgym_api::Error::ClientSetup(reason) => {
                CoreError::Internal(format!("HTTP client setup failed: {reason}"))
            }
            nrgym_api::Error::Http {
                endpoint,
                status,
                message,
            } => CoreError::Api {
                message: format!("{endpoint}: {message}"),
                status: Some(status),
            },
            nrgym_api::Error::UnexpectedShape { endpoint, message } => {
                CoreError::UnexpectedResponse {
                    message: format!("{endpoint}: {message}"),
                }
            }
            nrgym_api::Error::Deserialization { message, body: _ } => {
                CoreError::UnexpectedResponse { message }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refused_connection_becomes_connection_failed() {
        let client = nrgym_api::PortalClient::new(
            url::Url::parse("http://127.0.0.1:1/").unwrap(),
            nrgym_api::Credentials::new("member@example.com", "pw".to_string()),
            &nrgym_api::TransportConfig::default(),
        )
        .unwrap();
        let api = client.login().await.unwrap_err();
        assert!(api.is_connect(), "got {api:?}");

        let core = CoreError::from(api);
        assert!(
            matches!(core, CoreError::ConnectionFailed { ref url, .. } if url.contains("127.0.0.1")),
            "got {core:?}"
        );
    }

    #[test]
    fn auth_errors_stay_auth() {
        let err = CoreError::from(nrgym_api::Error::SessionExpired);
        assert!(err.is_auth());

        let err = CoreError::from(nrgym_api::Error::Authentication {
            message: "bad password".into(),
        });
        assert_eq!(err.to_string(), "Authentication failed: bad password");
    }

    #[test]
    fn shape_errors_become_unexpected_response() {
        let err = CoreError::from(nrgym_api::Error::UnexpectedShape {
            endpoint: "/clientportal2/Clubs/Clubs/GetMembersInClubs".into(),
            message: "no club list".into(),
        });
        assert!(matches!(err, CoreError::UnexpectedResponse { .. }));
        assert!(!err.is_auth());
    }

    #[test]
    fn http_status_is_kept() {
        let err = CoreError::from(nrgym_api::Error::Http {
            endpoint: "/x".into(),
            status: 503,
            message: "down".into(),
        });
        assert!(matches!(err, CoreError::Api { status: Some(503), .. }));
    }
}
