//! Fogline - command-line client for the FogBugz XML API
//!
//! # Configuration
//!
//! Set the following environment variables (or use a `.env` file):
//!
//! - `FOGBUGZ_HOST`: host name of the FogBugz installation
//! - `FOGBUGZ_TOKEN`: API token, or `FOGBUGZ_EMAIL` and `FOGBUGZ_PASSWORD`
//!
//! # Usage
//!
//! ```bash
//! fogline search "assignedto:me" --max 10
//! fogline --format json list projects
//! fogline new-case --title "Printer on fire" --project Inbox
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use fogline::cli::Cli;
use fogline::{Config, FogBugzClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore errors if not found)
    dotenvy::dotenv().ok();

    // stdout carries the command output
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fogline=info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::debug!(host = %config.host, use_ssl = config.use_ssl, "Configuration loaded");

    let mut client = FogBugzClient::connect(&config)
        .await
        .context("Failed to connect to FogBugz")?;

    let logged_on = if client.is_logged_on() {
        false
    } else {
        let (Some(email), Some(password)) = (config.email.as_deref(), config.password()) else {
            bail!("Set FOGBUGZ_TOKEN, or FOGBUGZ_EMAIL and FOGBUGZ_PASSWORD");
        };
        client.logon(email, password).await.context("Logon failed")?;
        true
    };

    let result = cli.command.run(&client, cli.format).await;

    if logged_on {
        if let Err(e) = client.logoff().await {
            tracing::warn!(error = %e, "Logoff failed");
        }
    }

    println!("{}", result?.trim_end());
    Ok(())
}
