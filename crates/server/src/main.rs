use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use prometheus::Registry;
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chaindex_core::{
    load_config, validate_config, CatalogError, CatalogResolver, GithubContents,
    JsonCatalogStore, SourceBrowser, SqliteMirror,
};

use chaindex_server::api::create_router;
use chaindex_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("CHAINDEX_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("chaindex {} starting", VERSION);
    info!("Snapshot path: {:?}", config.catalog.snapshot_path);

    // Compute config hash for the startup log
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!("Config hash: {}", &config_hash[..16]);

    // Open the SQLite mirror when configured. A schema mismatch is a loud
    // boot failure, never adapted around at runtime.
    let mirror: Option<Arc<SqliteMirror>> = match &config.catalog.database_path {
        Some(path) => match SqliteMirror::new(path) {
            Ok(mirror) => {
                info!("Catalog mirror opened at {:?}", path);
                Some(Arc::new(mirror))
            }
            Err(e @ CatalogError::SchemaMismatch { .. }) => {
                return Err(e).context("Catalog mirror schema check failed");
            }
            Err(e) => {
                warn!("Catalog mirror unavailable ({}), serving bundled snapshot", e);
                None
            }
        },
        None => {
            info!("No catalog mirror configured, serving bundled snapshot");
            None
        }
    };

    // The bundled snapshot must load: it is the read path's last resort.
    let snapshot_store = JsonCatalogStore::new(config.catalog.snapshot_path.clone());
    let resolver = Arc::new(
        CatalogResolver::from_store(
            &snapshot_store,
            mirror,
            Duration::from_secs(config.catalog.freshness_secs),
            Duration::from_secs(config.catalog.db_timeout_secs),
        )
        .context("Failed to load bundled catalog snapshot")?,
    );
    info!(
        "Catalog resolver ready ({} bundled records)",
        resolver.bundled().repos.len()
    );

    // Source browser over the hosting contents API
    let contents =
        GithubContents::new(&config.browser.github).context("Failed to create contents client")?;
    let browser = Arc::new(SourceBrowser::new(
        Arc::new(contents),
        config.browser.clone(),
    ));
    info!("Source browser initialized");

    // Metrics registry
    let registry = Registry::new();
    chaindex_core::metrics::register_all(&registry).context("Failed to register metrics")?;

    let discovery_log_path = config.collector.as_ref().map(|c| c.log_path.clone());

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        resolver,
        browser,
        discovery_log_path,
        registry,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
