// Portal authentication
//
// Cookie-based session login. The login endpoint sets `CpAuthToken` in the
// client's jar; subsequent requests carry that cookie automatically and
// mirror it in an `Authorization: Bearer` header.

use reqwest::header::SET_COOKIE;
use secrecy::ExposeSecret;
use serde_json::json;
use tracing::debug;

use crate::auth::{AUTH_COOKIE, SessionToken, cookie_value};
use crate::endpoint::{Endpoint, LOGIN_HASH};
use crate::error::Error;
use crate::portal::client::{PortalClient, X_HASH, preview};

impl PortalClient {
    /// Authenticate with the portal using the client's email/password.
    ///
    /// `POST /clientportal2/Auth/Login` with
    /// `{"RememberMe": true, "Login": email, "Password": password}`.
    ///
    /// On success the `CpAuthToken` cookie becomes the session token. A
    /// non-2xx status, or a 2xx that sets no session cookie, is an
    /// [`Error::Authentication`].
    pub async fn login(&self) -> Result<(), Error> {
        let url = self.portal_url(Endpoint::Login.path())?;
        debug!("logging in at {}", url);

        let credentials = self.credentials();
        let body = json!({
            "RememberMe": true,
            "Login": credentials.email,
            "Password": credentials.password.expose_secret(),
        });

        self.clear_session();
        self.expire_session_cookie();
        let stale = self.jar_session_cookie();

        let resp = self
            .http()
            .post(url)
            .header(X_HASH, LOGIN_HASH)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {}", preview(&body)),
            });
        }

        // The jar has already absorbed Set-Cookie; read the header directly
        // too, for clients built without a shared jar. A jar value that
        // survived from before this request does not count.
        let from_header = resp
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|v| cookie_value(v.split(';').next().unwrap_or_default(), AUTH_COOKIE))
            .map(String::from);

        let token = from_header
            .or_else(|| {
                self.jar_session_cookie()
                    .filter(|jar| Some(jar) != stale.as_ref())
            })
            .ok_or_else(|| Error::Authentication {
                message: format!("login response did not set the {AUTH_COOKIE} cookie"),
            })?;

        self.set_session(SessionToken::new(token));
        debug!("login successful");
        Ok(())
    }

    /// Forget the current session; the next call logs in again.
    pub fn logout(&self) {
        debug!("dropping session");
        self.clear_session();
    }
}
