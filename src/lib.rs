//! # Fogline
//!
//! Fogline is a client library and command-line tool for the FogBugz XML API.
//!
//! FogBugz answers every command with a schema-less XML document. Fogline
//! turns those documents into ordered records whose field types follow the
//! server's tag naming convention (`ix*` integers, `f*` flags, `s*` text).
//!
//! ## Features
//!
//! - **Discovery**: the API endpoint and version are read from `api.xml`
//! - **Sessions**: logon with email and password, or reuse an existing token
//! - **Commands**: cases, projects, areas, fix-fors, people, wikis and more
//! - **Error handling**: server error codes mapped to typed errors, automatic
//!   retry of read-only commands on transient failures
//! - **Security**: tokens and passwords are never logged
//!
//! ## Architecture
//!
//! - [`config`] - Configuration from environment variables or builders
//! - [`error`] - Error types and the server error code table
//! - [`command`] - Command parameters and form encoding
//! - [`decode`] - XML response decoding into records
//! - [`client`] - HTTP client with one method per API command
//! - [`models`] - Records, session state and case helpers
//! - [`cli`] - Command-line interface definitions
//!
//! ## Configuration
//!
//! - `FOGBUGZ_HOST`: host name of the installation (required)
//! - `FOGBUGZ_TOKEN`: existing API token, or
//! - `FOGBUGZ_EMAIL` / `FOGBUGZ_PASSWORD`: credentials for logon
//!
//! Optional:
//! - `FOGBUGZ_USE_SSL`, `FOGBUGZ_ACCEPT_INVALID_CERTS`, `FOGBUGZ_TIMEOUT_SECS`,
//!   `FOGBUGZ_RETRY_READS`
//! - `RUST_LOG`: Log level (e.g., `fogline=debug`)
//!
//! ## Example
//!
//! ```ignore
//! use fogline::{Config, FogBugzClient};
//!
//! async fn example() -> Result<(), fogline::FoglineError> {
//!     let config = Config::from_env()?;
//!     let mut client = FogBugzClient::connect(&config).await?;
//!     client.logon("ada@example.com", "secret").await?;
//!
//!     let cases = client.search("status:active", Some(&["sTitle"]), Some(10)).await?;
//!     for (id, case) in &cases {
//!         println!("#{}: {:?}", id, case.get("sTitle"));
//!     }
//!
//!     client.logoff().await
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cli;
pub mod client;
pub mod command;
pub mod config;
pub mod decode;
pub mod error;
pub mod models;

pub use client::{FogBugzClient, PeopleFilter, PersonKind};
pub use config::Config;
pub use error::FoglineError;
