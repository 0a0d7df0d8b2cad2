//! Wavelength UI service - Main entry point
//!
//! Single long-running binary: resolves the data directory, opens the
//! SQLite database, starts the rating tracker, and serves the HTTP +
//! SSE interface.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wavelength_common::config;
use wavelength_common::events::EventBus;
use wavelength_ui::api::{self, AppContext};
use wavelength_ui::db;
use wavelength_ui::horoscope::HoroscopeClient;
use wavelength_ui::store::SqliteRatingStore;
use wavelength_ui::tracker::{GracePolicy, Tracker};

/// Command-line arguments for wavelength-ui
#[derive(Parser, Debug)]
#[command(name = "wavelength-ui")]
#[command(about = "Two-person daily mood tracker")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5750", env = "WAVELENGTH_PORT")]
    port: u16,

    /// Data directory holding the database
    #[arg(short, long, env = "WAVELENGTH_DATA_DIR")]
    data_dir: Option<String>,

    /// Gemini API key for horoscope fetching
    #[arg(long, env = "GEMINI_API_KEY")]
    gemini_api_key: Option<String>,

    /// Override the submission grace period, in seconds
    #[arg(long, env = "WAVELENGTH_GRACE_SECONDS")]
    grace_seconds: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wavelength_ui=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting Wavelength UI on port {}", args.port);

    // Resolve and prepare the data directory
    let data_dir = config::resolve_data_dir(args.data_dir.as_deref(), "WAVELENGTH_DATA_DIR");
    config::ensure_data_dir(&data_dir).context("Failed to prepare data directory")?;

    // Open or create the database
    let db_pool = db::connect(&data_dir)
        .await
        .context("Failed to open database")?;
    db::init_schema(&db_pool)
        .await
        .context("Failed to initialize database schema")?;

    // Grace period: CLI override, else the stored setting
    let grace_seconds = match args.grace_seconds {
        Some(seconds) => seconds,
        None => db::get_grace_seconds(&db_pool)
            .await
            .context("Failed to read grace period setting")?,
    };
    info!("Submission grace period: {}s", grace_seconds);

    // Rating store, event bus, and tracker
    let store = Arc::new(
        SqliteRatingStore::new(db_pool.clone())
            .await
            .context("Failed to load rating store")?,
    );
    let events = EventBus::new(256);
    let tracker = Tracker::start(store, events, GracePolicy::standard(grace_seconds));

    // Horoscope client; runs without the feature when no key is set
    let horoscope = HoroscopeClient::new(args.gemini_api_key)
        .context("Failed to create horoscope client")?;
    if !horoscope.is_configured() {
        info!("Gemini API key not set; horoscope fetching disabled");
    }

    let ctx = AppContext {
        tracker,
        horoscope: Arc::new(horoscope),
        db_pool,
    };

    let app = api::build_router(ctx);

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
