//! recipe-server - Recipe Manager HTTP API
//!
//! Serves the recipe CRUD API, stored recipe images, and a health endpoint
//! on top of a local SQLite database.

use anyhow::{Context, Result};
use clap::Parser;
use recipe_common::config::{load_toml_config, ConfigSource, RootFolderInitializer};
use recipe_common::db::init_database;
use recipe_server::config::{log_filter, resolve_log_level, Args, ServerConfig};
use recipe_server::uploads::ImageStore;
use recipe_server::{build_router, AppState};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing starts so the file can set the log level
    let (toml_config, config_source) =
        load_toml_config(args.config.as_deref()).context("Failed to load configuration")?;
    let log_level = resolve_log_level(&args, &toml_config);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter(&log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Recipe Manager (recipe-server) v{}",
        env!("CARGO_PKG_VERSION")
    );
    match &config_source {
        ConfigSource::File(path) => info!("Config file: {}", path.display()),
        ConfigSource::Defaults => warn!("No config file found, using built-in defaults"),
    }

    let config = ServerConfig::resolve(&args, &toml_config);
    info!("Root folder: {}", config.root_folder.display());

    let initializer = RootFolderInitializer::new(config.root_folder.clone());
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    info!("Database: {}", db_path.display());

    let images = ImageStore::new(initializer.uploads_path(), config.max_upload_bytes);
    info!(
        "Uploads: {} (max {} bytes)",
        images.dir().display(),
        images.max_bytes()
    );

    let state = AppState::new(pool.clone(), images);
    let app = build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("recipe-server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
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
