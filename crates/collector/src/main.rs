//! Collector - event ingestion into batch-delivery pipelines
//!
//! # Usage
//!
//! ```bash
//! collector
//! collector --config configs/collector.toml --log-level debug
//! COLLECTOR_ADDR=127.0.0.1:9000 DATASTORE_URL=http://clickhouse:8123 collector
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use beacon_collector::{AppState, build_pipelines, close_pipelines, router};
use beacon_config::{Config, LogFormat};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Config file used when `--config` is not given, if it exists
const DEFAULT_CONFIG_PATH: &str = "configs/collector.toml";

/// Collector - event ingestion into batch-delivery pipelines
#[derive(Parser, Debug)]
#[command(name = "collector")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter (e.g. "debug" or "beacon_pipeline=trace,info"); overrides `[log] level`
    #[arg(short, long)]
    log_level: Option<String>,

    /// Listen address; overrides `[server] listen`
    #[arg(long, env = "COLLECTOR_ADDR")]
    listen: Option<String>,

    /// ClickHouse URL; overrides `[sinks.clickhouse] url`
    #[arg(long, env = "DATASTORE_URL")]
    datastore_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    init_logging(&config.log.directive(cli.log_level.as_deref()), config.log.format)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.server.listen,
        sinks = ?config.sinks.enabled(),
        "collector starting"
    );

    if let Err(e) = run(config).await {
        error!(error = %e, "collector error");
        return Err(e);
    }

    info!("collector shutdown complete");
    Ok(())
}

/// Load the config file, then apply CLI and environment overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path).context("failed to load configuration")?,
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                Config::from_file(&default_path).context("failed to load configuration")?
            } else {
                Config::default()
            }
        }
    };

    if let Some(listen) = &cli.listen {
        config.server.listen = listen.clone();
    }
    if let Some(url) = &cli.datastore_url
        && let Some(ch) = config.sinks.clickhouse.as_mut()
    {
        ch.url = url.clone();
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn run(config: Config) -> Result<()> {
    let pipelines = build_pipelines(&config.sinks)
        .await
        .context("failed to start pipelines")?;

    let state = Arc::new(AppState::new(pipelines.clone()));
    let app = router(state);

    let listener = TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.server.listen))?;

    info!(addr = %config.server.listen, pipelines = pipelines.len(), "collector listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await;

    info!("shutdown signal received, draining pipelines...");
    close_pipelines(&pipelines, config.server.shutdown_timeout).await;

    served.context("server error")
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Console => registry
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }

    Ok(())
}
