use anyhow::Result;
use clap::Parser;
use radar_analytics::RadarEngine;
use radar_api::{server::ApiServer, state::AppState};
use radar_data::{HistoryService, KlineStore, MarketSource};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Market radar service", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Override the configured listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.debug);

    info!("Starting Market Radar");

    let mut config = radar_config::load(&args.config)?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // Process-scoped services, constructed once and passed by handle.
    let source = Arc::new(MarketSource::new(&config.source)?);
    let store = Arc::new(KlineStore::new(config.history.data_dir.clone())?);
    let history = Arc::new(HistoryService::new(
        source.clone(),
        store.clone(),
        &config.history,
    ));
    let thresholds = Arc::new(config.thresholds.clone());
    let engine = Arc::new(RadarEngine::new(
        history.clone(),
        source.clone(),
        thresholds,
    ));

    let state = AppState::new(
        engine,
        history,
        source,
        Duration::from_secs(config.broadcast.interval_secs),
    );

    let server = ApiServer::new(&config.server, state)?;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("API server error: {}", e);
        }
    });

    shutdown_signal().await;

    info!("Initiating graceful shutdown...");
    server_handle.abort();
    store.close().await;

    info!("Market Radar stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down...");
        }
    }
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
