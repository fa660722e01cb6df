//! Read-path resolver with graceful degradation.
//!
//! Every page render goes through [`CatalogResolver::load`], so it must
//! return promptly and must never fail: a fresh in-process cache is served
//! first, then the SQLite mirror under a bounded timeout, and on any mirror
//! failure the bundled snapshot loaded at startup. Only a defect in the
//! bundled snapshot itself can error, and that surfaces at construction
//! time, not per request.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::catalog::{CatalogError, CatalogSnapshot, JsonCatalogStore, SqliteMirror};
use crate::metrics;

/// Where a resolved snapshot came from, for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    Cache,
    Mirror,
    Bundled,
}

impl SnapshotSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotSource::Cache => "cache",
            SnapshotSource::Mirror => "mirror",
            SnapshotSource::Bundled => "bundled",
        }
    }
}

struct CachedSnapshot {
    snapshot: Arc<CatalogSnapshot>,
    fetched_at: Instant,
}

/// Resolver owning its cache; independent instances share no state.
pub struct CatalogResolver {
    bundled: Arc<CatalogSnapshot>,
    mirror: Option<Arc<SqliteMirror>>,
    freshness: Duration,
    db_timeout: Duration,
    cache: RwLock<Option<CachedSnapshot>>,
}

impl CatalogResolver {
    /// Build a resolver over an already-loaded bundled snapshot.
    pub fn new(
        bundled: CatalogSnapshot,
        mirror: Option<Arc<SqliteMirror>>,
        freshness: Duration,
        db_timeout: Duration,
    ) -> Self {
        Self {
            bundled: Arc::new(bundled),
            mirror,
            freshness,
            db_timeout,
            cache: RwLock::new(None),
        }
    }

    /// Build a resolver by loading and validating the bundled snapshot file.
    ///
    /// This is the one place a read-path error propagates: a missing or
    /// corrupt bundled snapshot is a packaging defect with no further
    /// fallback below it.
    pub fn from_store(
        store: &JsonCatalogStore,
        mirror: Option<Arc<SqliteMirror>>,
        freshness: Duration,
        db_timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let bundled = store.load()?;
        Ok(Self::new(bundled, mirror, freshness, db_timeout))
    }

    /// Resolve the current catalog snapshot. Infallible.
    pub async fn load(&self) -> Arc<CatalogSnapshot> {
        self.load_traced().await.0
    }

    /// Resolve the snapshot and report which source served it.
    pub async fn load_traced(&self) -> (Arc<CatalogSnapshot>, SnapshotSource) {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.fetched_at.elapsed() < self.freshness {
                    metrics::RESOLVER_LOADS.with_label_values(&["cache"]).inc();
                    return (Arc::clone(&cached.snapshot), SnapshotSource::Cache);
                }
            }
        }

        let (snapshot, source) = match &self.mirror {
            // No mirror configured (static/offline context): bundled only.
            None => (Arc::clone(&self.bundled), SnapshotSource::Bundled),
            Some(mirror) => match self.read_mirror(Arc::clone(mirror)).await {
                Ok(snapshot) => (Arc::new(snapshot), SnapshotSource::Mirror),
                Err(reason) => {
                    warn!(%reason, "Mirror read failed, serving bundled snapshot");
                    metrics::RESOLVER_FALLBACKS.inc();
                    (Arc::clone(&self.bundled), SnapshotSource::Bundled)
                }
            },
        };

        metrics::RESOLVER_LOADS
            .with_label_values(&[source.as_str()])
            .inc();

        let mut cache = self.cache.write().await;
        *cache = Some(CachedSnapshot {
            snapshot: Arc::clone(&snapshot),
            fetched_at: Instant::now(),
        });

        debug!(source = source.as_str(), repos = snapshot.repos.len(), "Catalog resolved");
        (snapshot, source)
    }

    /// Drop the cached snapshot so the next load re-reads the mirror.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }

    /// The bundled snapshot, for callers that need the last-resort data
    /// directly (e.g. startup diagnostics).
    pub fn bundled(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&self.bundled)
    }

    async fn read_mirror(&self, mirror: Arc<SqliteMirror>) -> Result<CatalogSnapshot, String> {
        let read = tokio::task::spawn_blocking(move || mirror.load_all());

        let (records, scraped_at) =
            match tokio::time::timeout(self.db_timeout, read).await {
                Err(_) => return Err("mirror read timed out".to_string()),
                Ok(Err(join_err)) => return Err(format!("mirror read task failed: {}", join_err)),
                Ok(Ok(Err(db_err))) => return Err(db_err.to_string()),
                Ok(Ok(Ok(loaded))) => loaded,
            };

        if records.is_empty() {
            return Err("mirror holds zero rows".to_string());
        }

        let mut snapshot = CatalogSnapshot::new(records, Vec::new());
        if let Some(scraped_at) = scraped_at {
            snapshot.scraped_at = scraped_at;
        }
        Ok(snapshot)
    }
}
