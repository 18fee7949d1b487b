// SPDX-License-Identifier: MIT OR Apache-2.0

//! Demo service: registers a simulated cleanup job, then waits for SIGINT/SIGTERM
//! (or an internal cancel) and shuts down within the graceful timeout.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use graceful_shutdown::{Shutdown, ShutdownConfig, ShutdownError};
use log::{error, info};

#[derive(Parser, Debug)]
#[command(name = "shutdown-demo", about = "Graceful shutdown coordinator demo")]
struct Cli {
    /// Config file (.toml, .yaml or .yml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Graceful timeout in milliseconds, overrides config and environment
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// How long the simulated cleanup job takes
    #[arg(long, default_value_t = 1000)]
    work_ms: u64,

    /// Cancel internally with an error after this many milliseconds
    #[arg(long)]
    cancel_after_ms: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
#[error("demo cancelled after {0} ms")]
struct DemoCancelled(u64);

fn load_config(cli: &Cli) -> Result<ShutdownConfig, ShutdownError> {
    let mut config = match &cli.config {
        Some(path) => ShutdownConfig::from_file(path)?,
        None => ShutdownConfig::default(),
    }
    .apply_env_overrides()?;
    if let Some(timeout_ms) = cli.timeout_ms {
        config.graceful_timeout_ms = timeout_ms;
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(2);
        }
    };

    let shutdown = Shutdown::with_config(&config);
    let work = Duration::from_millis(cli.work_ms);
    shutdown.add_cleanup(move |ctx| async move {
        info!("cleanup job started, {:?} left", ctx.remaining());
        tokio::select! {
            _ = tokio::time::sleep(work) => info!("cleanup job finished"),
            _ = ctx.cancelled() => info!("cleanup job abandoned at deadline"),
        }
    });

    if let Err(e) = shutdown.listen() {
        error!("Failed to listen for termination signals: {}", e);
        std::process::exit(2);
    }

    if let Some(after_ms) = cli.cancel_after_ms {
        let canceller = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(after_ms)).await;
            canceller.cancel_with(DemoCancelled(after_ms));
        });
    }

    info!(
        "Running with graceful timeout {:?}, press Ctrl-C to stop",
        shutdown.graceful_timeout()
    );
    match shutdown.done().await {
        Ok(()) => info!("Shutdown complete"),
        Err(cause) => {
            error!("Shutdown with cause: {}", cause);
            std::process::exit(1);
        }
    }
}
