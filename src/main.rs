//! Binary entry point.
//!
//! Startup is ordered and fail-fast: configuration first, then the
//! store and filters, the listener last so traffic only arrives once
//! everything is ready. Any startup error aborts before serving.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use preset_sync::config::{load_config, SyncConfig};
use preset_sync::filter::{OriginFilter, PatternFilter};
use preset_sync::http::HttpServer;
use preset_sync::lifecycle::{wait_for_signal, Shutdown};
use preset_sync::net::bind_with_fallback;
use preset_sync::observability;
use preset_sync::store::PresetStore;

/// Local-network form preset synchronization service.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => match load_config(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Configuration error: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => SyncConfig::default(),
    };

    observability::logging::init(&config.observability.log_level);

    tracing::info!(
        host = %config.listener.host,
        port = config.listener.port,
        storage = %config.storage.path.display(),
        access_mode = ?config.access_control.mode,
        auth_mode = ?config.auth.mode,
        "Configuration loaded"
    );

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: SyncConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = PresetStore::open(&config.storage.path)?;
    let origin = OriginFilter::from_config(&config.access_control);
    let patterns = PatternFilter::from_config(&config.pattern_filter)?;

    let listener = bind_with_fallback(&config.listener).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let grace = std::time::Duration::from_secs(config.timeouts.shutdown_grace_secs);

    let server = HttpServer::new(&config, store, origin, patterns);
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    wait_for_signal().await;
    shutdown.trigger();

    // Bounded drain: wait for in-flight requests, then force exit.
    match tokio::time::timeout(grace, server_task).await {
        Ok(joined) => joined??,
        Err(_) => tracing::warn!(
            grace_secs = config.timeouts.shutdown_grace_secs,
            "Grace period expired, closing remaining connections"
        ),
    }

    Ok(())
}
