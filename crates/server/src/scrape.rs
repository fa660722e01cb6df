//! One-shot discovery run.
//!
//! Loads the same config as the server, executes a single collection pass
//! and exits. Exit status 0 covers a completed run and a rate-limited halt
//! (the checkpoint makes the next invocation resume); hard failures
//! (config, snapshot persistence) exit 1.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chaindex_core::{
    load_config, validate_config, CatalogError, CollectorRunner, GithubSource,
    JsonCatalogStore, RuleClassifier, SqliteMirror,
};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Discovery run failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("CHAINDEX_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    let Some(collector_config) = config.collector.clone() else {
        bail!("No [collector] section configured; nothing to do");
    };

    let source = GithubSource::new(collector_config.github.clone())
        .context("Failed to create search client")?;

    let mirror: Option<Arc<SqliteMirror>> = match &config.catalog.database_path {
        Some(path) => match SqliteMirror::new(path) {
            Ok(mirror) => Some(Arc::new(mirror)),
            Err(e @ CatalogError::SchemaMismatch { .. }) => {
                return Err(e).context("Catalog mirror schema check failed");
            }
            Err(e) => {
                warn!("Catalog mirror unavailable ({}), snapshot only", e);
                None
            }
        },
        None => None,
    };

    let runner = CollectorRunner::new(
        Arc::new(source),
        Arc::new(RuleClassifier::new()),
        JsonCatalogStore::new(config.catalog.snapshot_path.clone()),
        mirror,
        collector_config,
    );

    let log = runner.run().await.context("Discovery run failed")?;

    info!(
        run_id = %log.run_id,
        added = log.new_records,
        updated = log.updated_records,
        skipped = log.skipped_records,
        errors = log.errors.len(),
        "Run summary"
    );
    for e in &log.errors {
        warn!("Query error: {}", e);
    }
    if log.rate_limited {
        info!("Run halted on rate limit; checkpoint saved for resume");
    }

    Ok(())
}
