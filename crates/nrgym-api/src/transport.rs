// Shared transport configuration for building reqwest::Client instances.
//
// The portal behaves like a browser-facing JSON backend: it expects the
// client portal's own request headers and a pre-seeded consent cookie jar.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::error::Error;

/// Browser user agent the portal's own web app sends.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Cookies the portal sets once a visitor accepts its consent banner.
const CONSENT_COOKIES: [&str; 2] = ["websiteAnalyticsConsent=true", "customTrackingKey=true"];

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub cookie_jar: Option<Arc<Jar>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            cookie_jar: None,
        }
    }
}

impl TransportConfig {
    /// Create a config with a fresh cookie jar (for session auth).
    pub fn with_cookie_jar(mut self) -> Self {
        self.cookie_jar = Some(Arc::new(Jar::default()));
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a `reqwest::Client` carrying the portal's default headers.
    ///
    /// `base_url` is the portal root; it drives the `Origin`/`Referer`
    /// headers and the domain of the seeded consent cookies.
    pub fn build_client(&self, base_url: &Url) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(portal_headers(base_url)?);

        if let Some(ref jar) = self.cookie_jar {
            for cookie in CONSENT_COOKIES {
                jar.add_cookie_str(cookie, base_url);
            }
            builder = builder.cookie_provider(Arc::clone(jar));
        }

        builder
            .build()
            .map_err(|e| Error::ClientSetup(format!("failed to build HTTP client: {e}")))
    }
}

/// The static header set the client portal's web app sends with every call.
fn portal_headers(base_url: &Url) -> Result<HeaderMap, Error> {
    let origin = base_url.as_str().trim_end_matches('/');
    let referer = format!("{origin}/clientportal2/");

    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(
        HeaderName::from_static("cp-lang"),
        HeaderValue::from_static("en"),
    );
    headers.insert(
        HeaderName::from_static("cp-mode"),
        HeaderValue::from_static("desktop"),
    );
    headers.insert(
        HeaderName::from_static("x-requested-with"),
        HeaderValue::from_static("XMLHttpRequest"),
    );
    headers.insert(header::ORIGIN, header_value(origin)?);
    headers.insert(header::REFERER, header_value(&referer)?);
    Ok(headers)
}

fn header_value(raw: &str) -> Result<HeaderValue, Error> {
    HeaderValue::from_str(raw)
        .map_err(|e| Error::ClientSetup(format!("invalid header value {raw:?}: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::cookie::CookieStore;

    use super::*;

    #[test]
    fn headers_follow_base_url() {
        let base = Url::parse("https://gym.example.com/").unwrap();
        let headers = portal_headers(&base).unwrap();
        assert_eq!(headers[header::ORIGIN], "https://gym.example.com");
        assert_eq!(
            headers[header::REFERER],
            "https://gym.example.com/clientportal2/"
        );
        assert_eq!(headers["cp-mode"], "desktop");
    }

    #[test]
    fn jar_is_seeded_with_consent_cookies() {
        let base = Url::parse("https://gym.example.com").unwrap();
        let config = TransportConfig::default().with_cookie_jar();
        config.build_client(&base).unwrap();

        let jar = config.cookie_jar.unwrap();
        let cookies = jar.cookies(&base).unwrap();
        let cookies = cookies.to_str().unwrap();
        assert!(cookies.contains("websiteAnalyticsConsent=true"));
        assert!(cookies.contains("customTrackingKey=true"));
    }
}
