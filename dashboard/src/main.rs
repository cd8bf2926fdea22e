//! FleetDash
//!
//! Operator-facing terminal dashboard for the fleet control backend: two
//! live table views (servers, tasks) on independent refresh timers, server
//! registration, command dispatch, and per-host public key editing.

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use tracing::info;

mod app;
mod config;
mod forms;
mod key_editor;
mod ui;
mod views;

use app::App;
use config::Config;
use fleetdash_client::ApiClient;

/// FleetDash terminal dashboard
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backend URL to connect to (overrides the config file)
    #[arg(short, long, env = "FLEETDASH_URL")]
    url: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Refresh period for both table views, in seconds
    #[arg(long)]
    refresh_secs: Option<u64>,

    /// Append tracing output to this file (the terminal is owned by the UI)
    #[arg(long, env = "FLEETDASH_LOG")]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    if let Some(path) = &args.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path))?;
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .with_writer(std::sync::Arc::new(file))
            .with_ansi(false)
            .init();
    }

    // Load configuration; explicit CLI args win
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(url) = args.url {
        config.base_url = url;
    }
    if let Some(secs) = args.refresh_secs {
        config.refresh_secs = secs;
    }
    info!(url = %config.base_url, refresh_secs = config.refresh_secs, "Starting FleetDash");

    let client = ApiClient::new(config.base_url.clone());
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let app = App::new(client, tx);
    app.start_sync(Duration::from_secs(config.refresh_secs));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = app.run(&mut terminal, rx).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}
