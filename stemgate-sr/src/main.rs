//! Stem Resolver (stemgate-sr) - Main entry point
//!
//! Resolves stem preview URLs for the storefront and coordinates the shared
//! audible playback slot, exposing both over a REST API with SSE events.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stemgate_sr::api::{self, AppState};
use stemgate_sr::config::ServiceConfig;
use stemgate_sr::playback::PlaybackCoordinator;
use stemgate_sr::resolver::cache::UrlCache;
use stemgate_sr::resolver::candidates::CandidateGenerator;
use stemgate_sr::resolver::files::{AudioFileIndex, HttpFileListing};
use stemgate_sr::resolver::matching::StemValidator;
use stemgate_sr::resolver::probe::HttpUrlProbe;
use stemgate_sr::resolver::resolve::Resolver;
use stemgate_sr::state::SharedState;

/// Command-line arguments for stemgate-sr
#[derive(Parser, Debug)]
#[command(name = "stemgate-sr")]
#[command(about = "Stem URL resolver service for the Stemgate storefront")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5770", env = "STEMGATE_SR_PORT")]
    port: u16,

    /// Config file path (TOML)
    #[arg(short, long, env = "STEMGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the stem URL cache location
    #[arg(long, env = "STEMGATE_CACHE_PATH")]
    cache_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stemgate_sr=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config_file =
        stemgate_common::config::resolve_config_file(args.config.as_deref(), "STEMGATE_CONFIG");
    let mut config = ServiceConfig::load(config_file.as_deref())
        .context("Failed to load service configuration")?;
    if let Some(cache_path) = args.cache_path {
        config.cache_path = cache_path;
    }
    let config = Arc::new(config);

    info!("Starting Stemgate stem resolver on port {}", args.port);
    info!("Stem URL cache: {}", config.cache_path.display());

    // Wire the service root: every component is constructed here and
    // shared explicitly.
    let state = Arc::new(SharedState::new());
    let validator = StemValidator::new(Arc::new(config.heuristics.clone()));

    let cache = Arc::new(UrlCache::open(&config.cache_path));
    let purged = cache.init_scan(&validator);
    if purged > 0 {
        info!(purged, "Purged mismatched entries from stem URL cache");
    }

    let probe = Arc::new(
        HttpUrlProbe::new(&config.site_base_url, config.probe_timeout_ms)
            .context("Failed to build existence prober")?,
    );
    let listing = Arc::new(
        HttpFileListing::new(&config.listing_url, config.probe_timeout_ms)
            .context("Failed to build media listing client")?,
    );
    let index = Arc::new(AudioFileIndex::new(listing));

    let generator = CandidateGenerator::new(config.clone(), validator.clone());
    let resolver = Arc::new(Resolver::new(
        cache.clone(),
        validator,
        generator,
        probe,
        index,
        state.clone(),
    ));
    let coordinator = Arc::new(PlaybackCoordinator::new(state.clone()));

    let app = api::create_router(AppState {
        resolver,
        cache,
        coordinator,
        state,
        config,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
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
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
