//! Suivi-Rendement service binary.
//!
//! # Usage
//!
//! ```bash
//! # Run against the hosted backend configured in plant_config.toml
//! cargo run --release
//!
//! # Run fully in-process (no backend), e.g. for a demo floor terminal
//! cargo run --release -- --offline
//!
//! # Override the listen address
//! cargo run --release -- --addr 127.0.0.1:9090
//! ```
//!
//! # Environment Variables
//!
//! - `SUIVI_CONFIG`: Path to the plant config TOML (default: ./plant_config.toml)
//! - `SUIVI_CORS_ORIGINS`: Comma-separated allowed CORS origins (dev only)
//! - `RUST_LOG`: Logging level (default: info)

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use suivi_rendement::api::{self, ApiState};
use suivi_rendement::auth::StaticCredentials;
use suivi_rendement::backend::{MemorySource, RecordsSource, RestBackend, SnapshotCache};
use suivi_rendement::config::PlantConfig;
use suivi_rendement::session::SessionStore;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "suivi-rendement")]
#[command(about = "Plant productivity KPI & alert service")]
#[command(version)]
struct CliArgs {
    /// Override the listen address (default from config, "0.0.0.0:8080")
    #[arg(short, long)]
    addr: Option<String>,

    /// Path to the plant config TOML (overrides the search order)
    #[arg(long, value_name = "PATH")]
    config: Option<String>,

    /// Override the hosted backend base URL
    #[arg(long, value_name = "URL")]
    backend_url: Option<String>,

    /// Run with an in-process records store instead of the hosted backend
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();

    let mut config = match &args.config {
        Some(path) => {
            let (config, _warnings) = PlantConfig::load_from_file(Path::new(path))
                .with_context(|| format!("failed to load config from {path}"))?;
            config
        }
        None => PlantConfig::load().0,
    };
    if let Some(url) = args.backend_url {
        config.backend.url = url;
    }
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    config.validate().context("invalid plant configuration")?;

    info!(
        plant = %config.plant.name,
        site = %config.plant.site,
        "starting suivi-rendement v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Pick the records source: hosted backend, or in-process for offline use.
    let source: Arc<dyn RecordsSource> = if args.offline || config.backend.url.is_empty() {
        if !args.offline {
            warn!("no backend URL configured, falling back to in-process records store");
        }
        info!("records source: in-process (offline)");
        Arc::new(MemorySource::new())
    } else {
        info!(url = %config.backend.url, "records source: hosted backend");
        Arc::new(RestBackend::from_config(&config.backend).context("failed to build backend client")?)
    };

    let cache = Arc::new(SnapshotCache::new(
        Arc::clone(&source),
        Duration::from_secs(config.backend.cache_ttl_secs),
    ));

    let credentials = StaticCredentials::from_config(&config.credentials);
    if credentials.is_empty() {
        warn!("credential table is empty — every login will be rejected");
    }

    let sessions = Arc::new(SessionStore::new(config.thresholds.clone()));

    let state = ApiState::new(
        sessions,
        cache,
        source,
        Arc::new(credentials),
        config.plant.clone(),
    );

    let app = api::create_app(state);
    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.addr))?;
    info!(addr = %config.server.addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("shutdown complete");
    Ok(())
}

/// Resolve when the process receives Ctrl-C / SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            warn!("failed to install Ctrl-C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
