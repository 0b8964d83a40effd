//! Error types for the fogline client.
//!
//! This module defines `FoglineError`, the unified error type used throughout
//! the crate, and the fixed table of FogBugz server error codes.
//!
//! # Security
//!
//! Session tokens and passwords must never appear in logs or error text.
//! Use `sanitize_message()` when building messages from external sources.

use std::time::Duration;
use thiserror::Error;

/// Server error codes reported in `<error code="N">` elements.
pub mod codes {
    /// FogBugz is not initialized.
    pub const NOT_INITIALIZED: u32 = 0;
    /// Logon failed: incorrect username or password.
    pub const BAD_CREDENTIALS: u32 = 1;
    /// Logon failed: more than one account matched the name.
    pub const AMBIGUOUS_USER: u32 = 2;
    /// The command requires a logged-on session.
    pub const NOT_LOGGED_ON: u32 = 3;

    /// Returns the fixed description for a known server error code.
    ///
    /// There is no entry for code 11.
    #[must_use]
    pub fn describe(code: u32) -> Option<&'static str> {
        let text = match code {
            0 => "FogBugz not initialized.  Database may be down or needs to be upgraded",
            1 => "Log On problem - Incorrect Username or Password",
            2 => "Log On problem - multiple matches for username",
            3 => "You are not logged on.",
            4 => "Argument is missing from query",
            5 => "Edit problem - the case you are trying to edit could not be found",
            6 => "Edit problem - the action you are trying to perform on this case is not permitted",
            7 => "Time tracking problem - you can't add a time interval to this case because the case can't be found, is closed, has no estimate, or you don't have permission",
            8 => "New case problem - you can't write to any project",
            9 => "Case has changed since last view",
            10 => "Search problem - an error occurred in search.",
            12 => "Wiki creation problem",
            13 => "Wiki permission problem",
            14 => "Wiki load error",
            15 => "Wiki template error",
            16 => "Wiki commit error",
            17 => "No such project",
            18 => "No such user",
            19 => "Area creation problem",
            20 => "FixFor creation problem",
            21 => "Project creation problem",
            22 => "User creation problem",
            _ => return None,
        };
        Some(text)
    }
}

/// Unified error type for all fogline operations.
#[derive(Error, Debug)]
pub enum FoglineError {
    /// Configuration error - missing or invalid settings.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP request failed during transmission.
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// HTTP client initialization failed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// HTTP response returned a non-success status code.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code returned.
        status: reqwest::StatusCode,
        /// The (sanitized, truncated) response body.
        body: String,
    },

    /// Request timed out.
    #[error("request timed out after {duration:?} - the server may be slow or unreachable")]
    Timeout {
        /// How long we waited before timing out.
        duration: Duration,
        /// The command or request that timed out.
        operation: String,
    },

    /// Rate limited by the server (HTTP 429).
    #[error("rate limited by server - please wait before retrying")]
    RateLimited {
        /// Suggested retry delay, if provided by server.
        retry_after: Option<Duration>,
    },

    /// Server temporarily unavailable (HTTP 502/503/504).
    #[error("service temporarily unavailable ({status})")]
    ServiceUnavailable {
        /// The specific status code.
        status: reqwest::StatusCode,
    },

    /// The server requires a newer API version than this client speaks.
    #[error("API version mismatch: server requires version {required}, client supports {supported}")]
    ProtocolVersion {
        /// The server's minimum supported API version.
        required: i64,
        /// The API version implemented by this client.
        supported: i64,
    },

    /// The response body was not well-formed XML.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Logon rejected the credentials.
    #[error("authentication failed (code {code}): {message}")]
    Authentication {
        /// Server error code (1).
        code: u32,
        /// Message reported by the server.
        message: String,
    },

    /// Logon matched more than one account.
    #[error("ambiguous user: {message} ({})", .candidates.join(", "))]
    AmbiguousUser {
        /// Message reported by the server.
        message: String,
        /// Full names of the matching accounts.
        candidates: Vec<String>,
    },

    /// The server reported an error for a command.
    #[error("API error {code}: {message}")]
    Api {
        /// Server error code.
        code: u32,
        /// Message reported by the server.
        message: String,
        /// Fixed description from the code table, when the code is known.
        description: Option<&'static str>,
    },

    /// A repeated element lacked its key field.
    #[error("<{element}> element is missing its <{field}> key field")]
    MissingKeyField {
        /// The repeated element being decoded.
        element: String,
        /// The expected key child.
        field: String,
    },

    /// Input validation failed before sending.
    #[error("validation error: {0}")]
    Validation(String),
}

impl FoglineError {
    /// Creates a configuration error for a missing environment variable.
    pub fn missing_env(var_name: &str) -> Self {
        FoglineError::Config(format!(
            "missing required environment variable: {}",
            var_name
        ))
    }

    /// Creates a configuration error for an invalid value.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        FoglineError::Config(message.into())
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        FoglineError::Validation(message.into())
    }

    /// Creates a malformed response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        FoglineError::MalformedResponse(message.into())
    }

    /// Creates a timeout error.
    pub fn timeout(duration: Duration, operation: impl Into<String>) -> Self {
        FoglineError::Timeout {
            duration,
            operation: operation.into(),
        }
    }

    /// Creates an API error, attaching the code table description when known.
    pub fn api(code: u32, message: impl Into<String>) -> Self {
        FoglineError::Api {
            code,
            message: message.into(),
            description: codes::describe(code),
        }
    }

    /// Returns the server error code carried by this error, if any.
    #[must_use]
    pub fn server_code(&self) -> Option<u32> {
        match self {
            FoglineError::Authentication { code, .. } | FoglineError::Api { code, .. } => {
                Some(*code)
            }
            FoglineError::AmbiguousUser { .. } => Some(codes::AMBIGUOUS_USER),
            _ => None,
        }
    }

    /// Returns true if this error is transient and the operation may be retried.
    ///
    /// Retryable errors include:
    /// - Rate limiting (HTTP 429)
    /// - Service unavailable (HTTP 502, 503, 504)
    /// - Timeouts and connection failures
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            FoglineError::RateLimited { .. } => true,
            FoglineError::ServiceUnavailable { .. } => true,
            FoglineError::Timeout { .. } => true,
            FoglineError::Http(e) => e.is_timeout() || e.is_connect(),
            FoglineError::HttpStatus { status, .. } => {
                matches!(status.as_u16(), 429 | 502 | 503 | 504)
            }
            _ => false,
        }
    }

    /// Returns true if this is a rate limit error, indicating we should back off.
    #[must_use]
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, FoglineError::RateLimited { .. })
            || matches!(self, FoglineError::HttpStatus { status, .. } if status.as_u16() == 429)
    }

    /// Returns the suggested delay before retry, if any.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            FoglineError::RateLimited { retry_after } => *retry_after,
            FoglineError::ServiceUnavailable { .. } => Some(Duration::from_millis(500)),
            FoglineError::Timeout { .. } => Some(Duration::from_millis(100)),
            _ => None,
        }
    }

    /// Replaces every occurrence of `secret` in `message` with `[REDACTED]`.
    #[must_use]
    pub fn sanitize_message(message: &str, secret: &str) -> String {
        if secret.is_empty() {
            return message.to_string();
        }
        message.replace(secret, "[REDACTED]")
    }

    /// Creates a sanitized version of this error's display message.
    #[must_use]
    pub fn sanitized_display(&self, secret: &str) -> String {
        Self::sanitize_message(&self.to_string(), secret)
    }
}
