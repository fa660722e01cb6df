use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{browser, catalog, discovery, handlers, metrics};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Catalog (search / filter / sort over the resolved snapshot)
        .route("/catalog", get(catalog::list_catalog))
        .route("/catalog/stats", get(catalog::get_stats))
        // Per-repository detail and source viewing
        .route("/repos/{owner}/{name}", get(catalog::get_repo))
        .route("/repos/{owner}/{name}/code", get(browser::get_code))
        .route("/repos/{owner}/{name}/archive", get(browser::get_archive))
        // Discovery visibility
        .route("/discovery/log", get(discovery::get_log));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(metrics::export))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
