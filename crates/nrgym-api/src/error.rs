use thiserror::Error;

/// Coarse classification of every [`Error`].
///
/// The portal only ever fails in two ways that matter to callers: the
/// session is not (or no longer) accepted, or the data could not be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad credentials or an expired/invalid session.
    Authentication,
    /// Network failure, unexpected HTTP status, or unexpected payload shape.
    Fetch,
}

/// Top-level error type for the `nrgym-api` crate.
///
/// `nrgym-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, unexpected login response).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The portal kept rejecting the session after a fresh login.
    #[error("Session expired -- re-authentication did not help")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be built (TLS backend, bad header value).
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),

    // ── Portal ──────────────────────────────────────────────────────
    /// Non-success HTTP status from a portal endpoint.
    #[error("Portal returned HTTP {status} for {endpoint}: {message}")]
    Http {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// The payload parsed as JSON but did not have the expected shape.
    #[error("Unexpected response from {endpoint}: {message}")]
    UnexpectedShape { endpoint: String, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Classify this error as an authentication or a fetch failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication { .. } | Self::SessionExpired => ErrorKind::Authentication,
            Self::Transport(_)
            | Self::InvalidUrl(_)
            | Self::ClientSetup(_)
            | Self::Http { .. }
            | Self::UnexpectedShape { .. }
            | Self::Deserialization { .. } => ErrorKind::Fetch,
        }
    }

    /// Returns `true` if this error indicates auth has failed or expired.
    pub fn is_auth(&self) -> bool {
        self.kind() == ErrorKind::Authentication
    }

    /// Returns `true` if the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// Returns `true` if the portal could not be reached at all.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_connect())
    }
}
