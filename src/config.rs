use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::error::Error;

/// Client configuration for the Yariga session layer.
///
/// Every field has a default, so `ClientConfig::default()` talks to a local
/// backend on port 8080.
///
/// ```rust,ignore
/// use yariga_auth::ClientConfig;
///
/// let config = ClientConfig::default()
///     .with_api_url("https://api.yariga.example/api/v1".parse()?)
///     .with_request_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ClientConfig {
    pub(crate) api_url: Url,
    pub(crate) revoke_url: Url,
    pub(crate) request_timeout: Duration,
    pub(crate) login_redirect: String,
    pub(crate) logout_redirect: String,
    pub(crate) session_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api/v1"
                .parse()
                .expect("valid default URL"),
            revoke_url: "https://oauth2.googleapis.com/revoke"
                .parse()
                .expect("valid default URL"),
            request_timeout: Duration::from_secs(10),
            login_redirect: "/".into(),
            logout_redirect: "/login".into(),
            session_file: PathBuf::from(".yariga/session.json"),
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables.
    ///
    /// # Optional env vars
    /// - `YARIGA_API_URL`: REST API base URL
    /// - `YARIGA_REVOKE_URL`: identity provider token revocation endpoint
    /// - `YARIGA_REQUEST_TIMEOUT_SECS`: timeout for backend calls, in seconds
    /// - `YARIGA_LOGIN_REDIRECT`: redirect target after login
    /// - `YARIGA_LOGOUT_REDIRECT`: redirect target after logout or a failed check
    /// - `YARIGA_SESSION_FILE`: path of the persisted session file
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a URL or the timeout cannot be parsed.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Self::default();

        if let Some(url_str) = lookup("YARIGA_API_URL") {
            let url: Url = url_str
                .parse()
                .map_err(|e| Error::Config(format!("YARIGA_API_URL: {e}")))?;
            config = config.with_api_url(url);
        }
        if let Some(url_str) = lookup("YARIGA_REVOKE_URL") {
            let url: Url = url_str
                .parse()
                .map_err(|e| Error::Config(format!("YARIGA_REVOKE_URL: {e}")))?;
            config = config.with_revoke_url(url);
        }
        if let Some(secs) = lookup("YARIGA_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("YARIGA_REQUEST_TIMEOUT_SECS: {e}")))?;
            if secs == 0 {
                return Err(Error::Config(
                    "YARIGA_REQUEST_TIMEOUT_SECS must be greater than zero".into(),
                ));
            }
            config = config.with_request_timeout(Duration::from_secs(secs));
        }
        if let Some(path) = lookup("YARIGA_LOGIN_REDIRECT") {
            config = config.with_login_redirect(path);
        }
        if let Some(path) = lookup("YARIGA_LOGOUT_REDIRECT") {
            config = config.with_logout_redirect(path);
        }
        if let Some(path) = lookup("YARIGA_SESSION_FILE") {
            config = config.with_session_file(path);
        }

        Ok(config)
    }

    /// Override the REST API base URL.
    #[must_use]
    pub fn with_api_url(mut self, url: Url) -> Self {
        self.api_url = url;
        self
    }

    /// Override the identity provider revocation endpoint.
    #[must_use]
    pub fn with_revoke_url(mut self, url: Url) -> Self {
        self.revoke_url = url;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_login_redirect(mut self, path: impl Into<String>) -> Self {
        self.login_redirect = path.into();
        self
    }

    #[must_use]
    pub fn with_logout_redirect(mut self, path: impl Into<String>) -> Self {
        self.logout_redirect = path.into();
        self
    }

    #[must_use]
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = path.into();
        self
    }

    /// REST API base URL.
    #[must_use]
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Identity provider revocation endpoint.
    #[must_use]
    pub fn revoke_url(&self) -> &Url {
        &self.revoke_url
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    #[must_use]
    pub fn login_redirect(&self) -> &str {
        &self.login_redirect
    }

    #[must_use]
    pub fn logout_redirect(&self) -> &str {
        &self.logout_redirect
    }

    #[must_use]
    pub fn session_file(&self) -> &Path {
        &self.session_file
    }

    /// Resolve `path` against the API base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the joined URL is invalid.
    pub fn endpoint(&self, path: &str) -> Result<Url, Error> {
        let joined = format!(
            "{}/{}",
            self.api_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        joined
            .parse()
            .map_err(|e| Error::Config(format!("endpoint {path}: {e}")))
    }

    /// Build the shared HTTP client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the TLS backend cannot be initialized.
    pub fn http_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(Into::into)
    }
}
