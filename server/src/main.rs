//! snipewatch-server - standalone headless runner for the stream-snipe
//! detection pipeline.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;

use crate::config::ServerConfig;

/// snipewatch-server - polls a streaming platform for broadcasts of a
/// configured game, grabs frames, OCR-reads player nicknames, and alerts
/// configured streamers on a nickname match.
#[derive(Parser, Debug)]
#[command(name = "snipewatch-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "SNIPEWATCH_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Overrides `twitch.game_id` from the config file.
    #[arg(long, env = "SNIPEWATCH_GAME_ID")]
    game_id: Option<String>,

    /// Run the alert loop in dry-run mode (log instead of sending chat messages).
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("snipewatch-server v{}", env!("CARGO_PKG_VERSION"));

    let mut config =
        ServerConfig::load(args.config.as_deref()).context("failed to load configuration")?;

    if let Some(game_id) = args.game_id {
        config.twitch.game_id = game_id;
    }
    if args.dry_run {
        config.alert.dry_run = true;
    }

    let core_config = config.to_core_config();

    let services = snipewatch_core::bootstrap_services(&core_config)
        .await
        .context("failed to bootstrap services")?;

    log::info!("services bootstrapped successfully");

    let roster_fetcher = services.roster_fetcher.clone();
    tokio::spawn(async move { roster_fetcher.run().await });

    let pipeline = services.pipeline.clone();
    let pipeline_cancel = services.cancel_token.clone();
    tokio::spawn(async move { pipeline.run(&pipeline_cancel).await });

    let alert_loop = services.alert_loop.clone();
    tokio::spawn(async move { alert_loop.run().await });

    log::info!("background loops started");

    shutdown_signal().await;
    log::info!("shutdown signal received, cleaning up...");

    services.shutdown();

    log::info!("shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
