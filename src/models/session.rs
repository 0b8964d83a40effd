//! Session state and capability probe results.

use std::fmt;

/// API version implemented by this client.
///
/// A server whose `minversion` exceeds this value is refused.
pub const API_VERSION: i64 = 5;

/// Result of `GET /api.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiInfo {
    /// API version spoken by the server.
    pub version: i64,
    /// Oldest API version the server still accepts.
    pub minversion: i64,
    /// Command endpoint path, relative to the host (e.g. `api.asp?`).
    pub url: String,
}

impl ApiInfo {
    /// Returns true if this client can talk to the server.
    pub fn is_supported(&self) -> bool {
        self.minversion <= API_VERSION
    }

    /// Returns the absolute command endpoint path (`/api.asp?`).
    pub fn endpoint_path(&self) -> String {
        format!("/{}", self.url.trim_start_matches('/'))
    }
}

/// Connection and authentication state of one client.
#[derive(Clone)]
pub struct Session {
    /// Host the client is connected to.
    pub host: String,
    /// Whether HTTPS is used.
    pub use_ssl: bool,
    /// Absolute command endpoint path.
    pub api_url: String,
    /// Server API version.
    pub api_version: i64,
    /// Server minimum API version.
    pub api_minversion: i64,
    token: String,
}

impl Session {
    /// Creates a session from probe results. An empty token means logged out.
    pub fn new(host: impl Into<String>, use_ssl: bool, info: &ApiInfo, token: Option<&str>) -> Self {
        Self {
            host: host.into(),
            use_ssl,
            api_url: info.endpoint_path(),
            api_version: info.version,
            api_minversion: info.minversion,
            token: token.unwrap_or_default().to_string(),
        }
    }

    /// Returns the current token (empty when logged out).
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns true if a token is held.
    pub fn is_logged_on(&self) -> bool {
        !self.token.is_empty()
    }

    pub(crate) fn set_token(&mut self, token: impl Into<String>) {
        self.token = token.into();
    }

    pub(crate) fn clear_token(&mut self) {
        self.token.clear();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.host)
            .field("use_ssl", &self.use_ssl)
            .field("api_url", &self.api_url)
            .field("api_version", &self.api_version)
            .field("api_minversion", &self.api_minversion)
            .field("logged_on", &self.is_logged_on())
            .finish()
    }
}
