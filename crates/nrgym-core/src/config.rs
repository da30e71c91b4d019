// ── Runtime portal configuration ──
//
// Everything the coordinator needs to talk to the portal. Built by the
// CLI from its profile config; core never reads files or the keyring.

use std::time::Duration;

use nrgym_api::Credentials;
use url::Url;

/// Refresh cadence when none is configured.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(3600);

/// Connection settings for one portal account.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Portal root, e.g. `https://nrggym.perfectgym.com`.
    pub url: Url,
    pub credentials: Credentials,
    /// Club used for the bookings calendar. When unset, the member's home
    /// club is looked up at connect time.
    pub club_id: Option<i64>,
    /// Member id for profile and contract calls; looked up when unset.
    pub user_id: Option<i64>,
    /// Bookings endpoint tried before the built-in ones.
    pub bookings_path: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Time between background refreshes.
    pub update_interval: Duration,
}

impl PortalConfig {
    pub fn new(url: Url, credentials: Credentials) -> Self {
        Self {
            url,
            credentials,
            club_id: None,
            user_id: None,
            bookings_path: None,
            timeout: nrgym_api::transport::DEFAULT_TIMEOUT,
            update_interval: DEFAULT_UPDATE_INTERVAL,
        }
    }
}
