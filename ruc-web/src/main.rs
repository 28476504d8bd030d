//! ruc-web - RUClasses course review service
//!
//! Serves the JSON API for browsing subjects, signing in, and writing,
//! editing and deleting class reviews.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ruc_common::config::{AppConfig, CliOverrides};
use ruc_common::db::init_database;
use ruc_common::identity::load_shared_secret;
use ruc_web::{build_router, AppState};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for ruc-web
#[derive(Parser, Debug)]
#[command(name = "ruc-web")]
#[command(about = "RUClasses course review service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "RUC_PORT")]
    port: Option<u16>,

    /// SQLite database file
    #[arg(short, long, env = "RUC_DATABASE")]
    database: Option<PathBuf>,

    /// TOML config file (RUC_CONFIG is consulted when this is absent)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Log level from the config file applies once it is read, unless RUST_LOG is set
    let rust_log_set = std::env::var("RUST_LOG").is_ok();
    let (filter, filter_handle) = reload::Layer::new(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before any database delay
    info!(
        "Starting RUClasses (ruc-web) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = AppConfig::load(&CliOverrides {
        config: args.config,
        port: args.port,
        database: args.database,
    });

    if !rust_log_set {
        let level = EnvFilter::try_new(&config.log_level).unwrap_or_else(|e| {
            warn!("Invalid logging.level {:?} ({}), keeping info", config.log_level, e);
            EnvFilter::new("info")
        });
        filter_handle
            .reload(level)
            .context("Failed to apply log level")?;
    }

    info!("Database path: {}", config.database_path.display());
    info!("{} subjects in catalog", config.catalog.subjects().len());

    let pool = match init_database(&config.database_path).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let shared_secret = load_shared_secret(&pool)
        .await
        .context("Failed to load sign-in shared secret")?;
    if shared_secret == 0 {
        warn!("Sign-in assertion checking disabled (shared_secret = 0)");
    } else {
        info!("✓ Loaded shared secret for sign-in assertions");
    }

    let addr = format!("{}:{}", config.bind_address, config.port);
    let state = AppState::new(pool, config, shared_secret);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("ruc-web listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
