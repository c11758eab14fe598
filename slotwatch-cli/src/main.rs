//! Command line monitor alerting on newly opened NDLS appointment slots.

mod config;
mod notify;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use reqwest::Client;
use slotwatch_core::{resolve_centre, NdlsClient, SlotWatcher};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::notify::{CompositeAlert, ConsoleAlert, TerminalBell};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "slotwatch")]
#[command(about = "Watch an NDLS centre for newly opened appointment slots", long_about = None)]
struct Cli {
    /// Path to the configuration file with the driver's login details.
    #[arg(long, default_value = "slotwatch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll one centre for new slots until interrupted
    Slots {
        /// Free-text centre name, fuzzy-matched against "location, county"
        centre_name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Slots { centre_name } => slots(&cli.config, &centre_name).await,
    }
}

/// Authenticate, resolve the centre, then watch it until Ctrl-C. Every
/// failure propagates here and exits the process non-zero; there is no
/// retry anywhere, since a failed poll most likely means an expired
/// session.
async fn slots(config_path: &Path, centre_name: &str) -> Result<()> {
    let config = Config::load(config_path)?;

    let http = Client::builder()
        .user_agent("slotwatch/0.1")
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    let client = NdlsClient::new(http);

    let session = client
        .create_authenticated_session(&config.login_details())
        .await?;
    let centre = resolve_centre(&client, &session, centre_name).await?;

    tracing::info!(%centre, "watching centre");

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, stopping");
            ctrl_c_cancel.cancel();
        }
    });

    let sink = CompositeAlert::new(vec![Box::new(ConsoleAlert), Box::new(TerminalBell::default())]);

    let watcher = SlotWatcher::new(client, session, centre)
        .with_poll_interval(Duration::from_secs(config.poll_interval_secs));

    watcher.run(&sink, cancel).await?;

    Ok(())
}
