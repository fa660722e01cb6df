use std::path::PathBuf;
use std::sync::Arc;

use prometheus::Registry;

use chaindex_core::{CatalogResolver, Config, SanitizedConfig, SourceBrowser};

/// Shared application state
pub struct AppState {
    config: Config,
    resolver: Arc<CatalogResolver>,
    browser: Arc<SourceBrowser>,
    discovery_log_path: Option<PathBuf>,
    registry: Registry,
}

impl AppState {
    pub fn new(
        config: Config,
        resolver: Arc<CatalogResolver>,
        browser: Arc<SourceBrowser>,
        discovery_log_path: Option<PathBuf>,
        registry: Registry,
    ) -> Self {
        Self {
            config,
            resolver,
            browser,
            discovery_log_path,
            registry,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn resolver(&self) -> &CatalogResolver {
        &self.resolver
    }

    pub fn browser(&self) -> &SourceBrowser {
        &self.browser
    }

    pub fn discovery_log_path(&self) -> Option<&PathBuf> {
        self.discovery_log_path.as_ref()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
