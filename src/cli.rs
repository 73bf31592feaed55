//! CLI for Provisio
//!
//! Commands:
//! - `serve`: run the notification server (default)
//! - `watch`: observe one tenant's provisioning progress from a terminal

use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use provisio_client::{ProgressConnection, ProgressMonitor, WatchOptions};

/// Provisio CLI
#[derive(Parser, Debug)]
#[command(name = "provisio")]
#[command(about = "Tenant provisioning progress notifications")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the notification server (default)
    Serve,
    /// Follow a tenant's provisioning progress until it finishes
    Watch {
        /// Tenant to observe
        #[arg(long)]
        tenant: String,
        /// Progress WebSocket endpoint
        #[arg(long, default_value = "ws://127.0.0.1:8080/ws/progress")]
        url: String,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Watch { tenant, url }) => watch(tenant, url).await,
        Some(Commands::Serve) | None => crate::server::run().await,
    }
}

/// Follow one tenant's stream, printing updates, until a terminal event,
/// Ctrl-C, or a fatal protocol error.
async fn watch(tenant: String, url: String) -> Result<()> {
    let (outcome_tx, mut outcome_rx) =
        tokio::sync::mpsc::unbounded_channel::<std::result::Result<(), String>>();

    // Short grace: a terminal watcher has no redirect animation to wait for.
    let mut options = WatchOptions::new(url, tenant.clone());
    options.completion_grace = Duration::from_secs(1);

    let completed_tx = outcome_tx.clone();
    let monitor = ProgressMonitor::new(options.completion_grace)
        .on_progress(|event| {
            info!(
                step = event.step,
                percent = event.progress_percentage,
                "{}: {}",
                event.step_name,
                event.message
            );
        })
        .on_completed(move || {
            let _ = completed_tx.send(Ok(()));
        })
        .on_error(move |message| {
            let _ = outcome_tx.send(Err(message.to_string()));
        });

    let connection = ProgressConnection::new(options, monitor);
    connection.connect().await?;
    info!(%tenant, "watching provisioning progress (Ctrl-C to stop)");

    let outcome = tokio::select! {
        outcome = outcome_rx.recv() => outcome,
        _ = tokio::signal::ctrl_c() => None,
    };
    connection.disconnect().await;

    match outcome {
        Some(Ok(())) => {
            info!(%tenant, "provisioning completed");
            Ok(())
        }
        Some(Err(message)) => Err(anyhow!("provisioning failed: {message}")),
        None => Ok(()),
    }
}
