//! Configuration management for the fogline client.
//!
//! Configuration is loaded from environment variables (optionally seeded
//! from a `.env` file by the binary) or built programmatically with
//! [`Config::new`] and the `with_*` methods.

use std::env;
use std::fmt;
use std::time::Duration;

use crate::error::FoglineError;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for connecting to a FogBugz installation.
///
/// The token and password are never included in the `Debug` output.
#[derive(Clone)]
pub struct Config {
    /// Host name of the installation, optionally with a port (`bugs.example.com:8080`).
    pub host: String,

    /// Whether to connect over HTTPS.
    pub use_ssl: bool,

    /// Skip TLS certificate validation. Only for self-signed installations.
    pub accept_invalid_certs: bool,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Retry read-only commands on transient failures.
    pub retry_reads: bool,

    /// Email used by the CLI to log on.
    pub email: Option<String>,

    token: Option<String>,
    password: Option<String>,
}

impl Config {
    /// Creates a configuration for `host` with default settings (HTTPS, 30s timeout).
    ///
    /// # Errors
    ///
    /// Returns `FoglineError::Config` if the host is not a bare host name.
    pub fn new(host: impl Into<String>) -> Result<Self, FoglineError> {
        let host = Self::validate_host(host.into())?;
        Ok(Self {
            host,
            use_ssl: true,
            accept_invalid_certs: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry_reads: true,
            email: None,
            token: None,
            password: None,
        })
    }

    /// Loads configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FOGBUGZ_HOST` (required): host name, optionally `host:port`
    /// - `FOGBUGZ_USE_SSL`: `true`/`false` (default `true`)
    /// - `FOGBUGZ_ACCEPT_INVALID_CERTS`: `true`/`false` (default `false`)
    /// - `FOGBUGZ_TOKEN`: an existing session token
    /// - `FOGBUGZ_EMAIL`, `FOGBUGZ_PASSWORD`: logon credentials
    /// - `FOGBUGZ_TIMEOUT_SECS`: request timeout (default 30)
    /// - `FOGBUGZ_RETRY_READS`: `true`/`false` (default `true`)
    ///
    /// # Errors
    ///
    /// Returns `FoglineError::Config` if the host is missing or any value
    /// fails validation.
    pub fn from_env() -> Result<Self, FoglineError> {
        let host = Self::get_required_env("FOGBUGZ_HOST")?;
        let mut config = Self::new(host)?;

        if let Some(value) = Self::get_optional_env("FOGBUGZ_USE_SSL") {
            config.use_ssl = Self::parse_bool("FOGBUGZ_USE_SSL", &value)?;
        }
        if let Some(value) = Self::get_optional_env("FOGBUGZ_ACCEPT_INVALID_CERTS") {
            config.accept_invalid_certs =
                Self::parse_bool("FOGBUGZ_ACCEPT_INVALID_CERTS", &value)?;
        }
        if let Some(value) = Self::get_optional_env("FOGBUGZ_RETRY_READS") {
            config.retry_reads = Self::parse_bool("FOGBUGZ_RETRY_READS", &value)?;
        }
        if let Some(value) = Self::get_optional_env("FOGBUGZ_TIMEOUT_SECS") {
            config.timeout = Self::parse_timeout(&value)?;
        }

        config.token = Self::get_optional_env("FOGBUGZ_TOKEN");
        config.email = Self::get_optional_env("FOGBUGZ_EMAIL");
        config.password = Self::get_optional_env("FOGBUGZ_PASSWORD");

        Ok(config)
    }

    /// Sets whether to use HTTPS.
    #[must_use]
    pub fn with_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = use_ssl;
        self
    }

    /// Disables TLS certificate validation.
    ///
    /// This trusts any certificate the server presents. Use it only for
    /// installations with self-signed certificates.
    #[must_use]
    pub fn with_invalid_certs_accepted(mut self) -> Self {
        self.accept_invalid_certs = true;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables or disables retries for read-only commands.
    #[must_use]
    pub fn with_retry_reads(mut self, retry: bool) -> Self {
        self.retry_reads = retry;
        self
    }

    /// Uses an existing session token instead of logging on.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets logon credentials.
    #[must_use]
    pub fn with_credentials(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self.password = Some(password.into());
        self
    }

    /// Returns the configured session token, if any.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Returns the configured logon password, if any.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Returns the base URL derived from the host and SSL flag.
    pub fn base_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}", scheme, self.host)
    }

    /// Gets a required environment variable, returning an error if missing or empty.
    fn get_required_env(name: &str) -> Result<String, FoglineError> {
        Self::get_optional_env(name).ok_or_else(|| FoglineError::missing_env(name))
    }

    fn get_optional_env(name: &str) -> Option<String> {
        env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Validates that the host carries no scheme, path or whitespace.
    fn validate_host(host: String) -> Result<String, FoglineError> {
        let host = host.trim().trim_end_matches('/').to_string();

        if host.is_empty() {
            return Err(FoglineError::invalid_config("host must not be empty"));
        }
        if host.contains("://") {
            return Err(FoglineError::invalid_config(
                "host must not include a scheme; use FOGBUGZ_USE_SSL instead",
            ));
        }
        if host.contains('/') || host.chars().any(char::is_whitespace) {
            return Err(FoglineError::invalid_config(format!(
                "host must be a bare host name, got: {:?}",
                host
            )));
        }

        Ok(host)
    }

    fn parse_bool(name: &str, value: &str) -> Result<bool, FoglineError> {
        match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(FoglineError::invalid_config(format!(
                "{} must be true or false, got: {:?}",
                name, value
            ))),
        }
    }

    fn parse_timeout(value: &str) -> Result<Duration, FoglineError> {
        match value.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(FoglineError::invalid_config(
                "FOGBUGZ_TIMEOUT_SECS must be a positive number of seconds",
            )),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("use_ssl", &self.use_ssl)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("timeout", &self.timeout)
            .field("retry_reads", &self.retry_reads)
            .field("email", &self.email)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
