// Portal HTTP client
//
// Wraps `reqwest::Client` with portal URL construction, the session token,
// and the one-shot re-login that every data call goes through. Endpoint
// groups (bookings, clubs, profile, contracts) are implemented as inherent
// methods in sibling files to keep this module focused on transport
// mechanics.

use std::sync::{Arc, RwLock};

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};
use url::Url;

use crate::auth::{AUTH_COOKIE, Credentials, SessionToken, cookie_value};
use crate::endpoint::PORTAL_PREFIX;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Header carrying the web app's navigation state.
pub(crate) const X_HASH: &str = "X-Hash";

/// Content type the portal's web app declares on every POST.
const JSON_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

/// Raw HTTP client for the gym's client portal.
///
/// Holds the login credentials and the captured `CpAuthToken`. Every data
/// call logs in first when no session is held, and logs in again exactly
/// once when the portal answers 401.
pub struct PortalClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    /// Preferred booking path, tried before the built-in candidates.
    bookings_path: Option<String>,
    /// Session token captured at login. The only state that changes
    /// between refreshes, besides the cached user id.
    session: RwLock<Option<SessionToken>>,
    /// User id learned from an identity or profile response.
    known_user_id: RwLock<Option<i64>>,
    /// Cookie jar reference for reading the session cookie back out.
    cookie_jar: Option<Arc<Jar>>,
}

impl PortalClient {
    /// Create a new portal client from a `TransportConfig`.
    ///
    /// If the config doesn't already include a cookie jar, one is created
    /// automatically (the session lives in a cookie). `base_url` is the
    /// portal root, e.g. `https://nrggym.perfectgym.com`.
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let cookie_jar = config.cookie_jar.clone();
        let http = config.build_client(&base_url)?;
        Ok(Self {
            http,
            base_url,
            credentials,
            bookings_path: None,
            session: RwLock::new(None),
            known_user_id: RwLock::new(None),
            cookie_jar,
        })
    }

    /// Create a portal client with a pre-built `reqwest::Client`.
    ///
    /// Without a shared jar the session token is read from the login
    /// response's `Set-Cookie` header instead.
    pub fn with_client(http: reqwest::Client, base_url: Url, credentials: Credentials) -> Self {
        Self {
            http,
            base_url,
            credentials,
            bookings_path: None,
            session: RwLock::new(None),
            known_user_id: RwLock::new(None),
            cookie_jar: None,
        }
    }

    /// Try `path` before the built-in booking endpoints.
    #[must_use]
    pub fn with_bookings_path(mut self, path: Option<String>) -> Self {
        self.bookings_path = path.filter(|p| !p.trim().is_empty());
        self
    }

    /// The underlying HTTP client (for auth flows that need direct access).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The portal base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub(crate) fn bookings_path(&self) -> Option<&str> {
        self.bookings_path.as_deref()
    }

    // ── Session state ─────────────────────────────────────────────────

    /// Whether a session token is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.session.read().expect("session lock poisoned").is_some()
    }

    /// The current session token, if logged in.
    pub fn session_token(&self) -> Option<SessionToken> {
        self.session.read().expect("session lock poisoned").clone()
    }

    pub(crate) fn set_session(&self, token: SessionToken) {
        debug!("storing session token");
        *self.session.write().expect("session lock poisoned") = Some(token);
    }

    pub(crate) fn clear_session(&self) {
        *self.session.write().expect("session lock poisoned") = None;
    }

    /// User id learned from a previous identity or profile call.
    pub fn known_user_id(&self) -> Option<i64> {
        *self.known_user_id.read().expect("user id lock poisoned")
    }

    pub(crate) fn remember_user_id(&self, user_id: i64) {
        trace!(user_id, "caching user id");
        *self.known_user_id.write().expect("user id lock poisoned") = Some(user_id);
    }

    /// The `CpAuthToken` cookie currently in the jar, if any.
    pub(crate) fn jar_session_cookie(&self) -> Option<String> {
        let jar = self.cookie_jar.as_ref()?;
        let cookies = jar.cookies(&self.base_url)?;
        let header = cookies.to_str().ok()?;
        cookie_value(header, AUTH_COOKIE).map(String::from)
    }

    /// Expire any `CpAuthToken` left in the jar by an earlier login.
    pub(crate) fn expire_session_cookie(&self) {
        if let Some(jar) = self.cookie_jar.as_ref() {
            jar.add_cookie_str(&format!("{AUTH_COOKIE}=; Max-Age=0; Path=/"), &self.base_url);
        }
    }

    /// Mirror the session token into the `Authorization` header.
    fn apply_session(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let guard = self.session.read().expect("session lock poisoned");
        match guard.as_ref() {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for a portal path: `{base}/clientportal2/{path}`.
    pub(crate) fn portal_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}{PORTAL_PREFIX}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a call with session handling.
    ///
    /// Logs in first when no session is held. A 401 clears the session,
    /// logs in again and repeats the call once; a second 401 is
    /// [`Error::SessionExpired`].
    pub(crate) async fn execute(&self, call: &PortalCall) -> Result<reqwest::Response, Error> {
        if !self.is_authenticated() {
            debug!(endpoint = %call.url.path(), "no session yet, logging in first");
            self.login().await?;
        }

        let resp = self.dispatch(call).await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        warn!(endpoint = %call.url.path(), "session rejected, logging in again");
        self.clear_session();
        self.login().await?;

        let resp = self.dispatch(call).await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            self.clear_session();
            return Err(Error::SessionExpired);
        }
        Ok(resp)
    }

    async fn dispatch(&self, call: &PortalCall) -> Result<reqwest::Response, Error> {
        debug!("{} {}", call.method, call.url);

        let mut builder = self.http.request(call.method.clone(), call.url.clone());
        if let Some(ref hash) = call.hash {
            builder = builder.header(X_HASH, hash);
        }
        builder = match call.body {
            CallBody::None => builder,
            CallBody::Empty => builder
                .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
                .body(Vec::new()),
            CallBody::Json(ref value) => builder.json(value),
        };

        Ok(self.apply_session(builder).send().await?)
    }

    /// Execute a call and parse the body as loosely-typed JSON.
    pub(crate) async fn fetch_json(&self, call: &PortalCall) -> Result<Value, Error> {
        let resp = self.execute(call).await?;
        parse_body(call, resp).await
    }

    /// Execute a call and deserialize the body into `T`.
    pub(crate) async fn fetch<T: DeserializeOwned>(&self, call: &PortalCall) -> Result<T, Error> {
        let value = self.fetch_json(call).await?;
        serde_json::from_value(value).map_err(|e| Error::UnexpectedShape {
            endpoint: call.endpoint(),
            message: e.to_string(),
        })
    }
}

/// Check the status and decode the JSON body of a portal response.
async fn parse_body(call: &PortalCall, resp: reqwest::Response) -> Result<Value, Error> {
    let status = resp.status();

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Http {
            endpoint: call.endpoint(),
            status: status.as_u16(),
            message: preview(&body).to_owned(),
        });
    }

    let body = resp.text().await?;
    trace!(endpoint = %call.endpoint(), body = %preview(&body), "response body");

    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(&body)),
        body,
    })
}

/// First 300 bytes of a body, cut on a char boundary.
pub(crate) fn preview(body: &str) -> &str {
    let mut end = body.len().min(300);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

// ── Call description ─────────────────────────────────────────────────

/// Request body variants the portal endpoints use.
#[derive(Debug, Clone)]
pub(crate) enum CallBody {
    /// No body (GET).
    None,
    /// Zero-length POST body with the JSON content type.
    Empty,
    Json(Value),
}

/// A replayable request: re-login needs to send it a second time.
#[derive(Debug, Clone)]
pub(crate) struct PortalCall {
    pub method: Method,
    pub url: Url,
    pub hash: Option<String>,
    pub body: CallBody,
}

impl PortalCall {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            hash: None,
            body: CallBody::None,
        }
    }

    pub fn post_empty(url: Url) -> Self {
        Self {
            method: Method::POST,
            url,
            hash: None,
            body: CallBody::Empty,
        }
    }

    pub fn post_json(url: Url, body: Value) -> Self {
        Self {
            method: Method::POST,
            url,
            hash: None,
            body: CallBody::Json(body),
        }
    }

    #[must_use]
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Path of the call, for error messages and logs.
    pub fn endpoint(&self) -> String {
        self.url.path().to_owned()
    }
}
