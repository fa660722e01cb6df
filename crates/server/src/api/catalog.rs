//! Catalog API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use chaindex_core::query::{filter, search, sort_records};
use chaindex_core::{CatalogStats, Category, ProgramRecord, RepoFilter, SortKey};

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CatalogQueryParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub min_stars: Option<u32>,
    #[serde(default)]
    pub max_stars: Option<u32>,
    #[serde(default)]
    pub sort: Option<SortKey>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

#[derive(Debug, Serialize)]
pub struct CatalogListResponse {
    pub entries: Vec<ProgramRecord>,
    /// Matching records before the limit was applied.
    pub total: usize,
    /// Where the snapshot came from ("cache", "mirror", "bundled").
    pub source: String,
    pub scraped_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/catalog
///
/// Search, filter and sort the catalog. Composes as search -> filter -> sort
/// over the resolved snapshot; never fails, even with the mirror down.
pub async fn list_catalog(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CatalogQueryParams>,
) -> Result<Json<CatalogListResponse>, impl IntoResponse> {
    let category = match params.category.as_deref() {
        None => None,
        Some(raw) => match Category::parse(raw) {
            Some(category) => Some(category),
            None => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("Unknown category: {}", raw),
                    }),
                ))
            }
        },
    };

    let (snapshot, source) = state.resolver().load_traced().await;

    let found = search(&snapshot.repos, params.q.as_deref().unwrap_or(""));
    let filtered = filter(
        &found,
        &RepoFilter {
            category,
            language: params.language.clone(),
            min_stars: params.min_stars,
            max_stars: params.max_stars,
        },
    );
    let mut sorted = sort_records(&filtered, params.sort.unwrap_or_default());

    let total = sorted.len();
    sorted.truncate(params.limit);

    Ok(Json(CatalogListResponse {
        entries: sorted,
        total,
        source: source.as_str().to_string(),
        scraped_at: snapshot.scraped_at,
    }))
}

/// GET /api/v1/catalog/stats
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<CatalogStats> {
    let snapshot = state.resolver().load().await;
    Json(CatalogStats::from_snapshot(&snapshot))
}

/// GET /api/v1/repos/{owner}/{name}
///
/// A record missing from the catalog is a not-found outcome, not a failure.
pub async fn get_repo(
    State(state): State<Arc<AppState>>,
    Path((owner, name)): Path<(String, String)>,
) -> Result<Json<ProgramRecord>, (StatusCode, Json<ErrorResponse>)> {
    let snapshot = state.resolver().load().await;
    let identity = format!("{}/{}", owner, name).to_lowercase();

    match snapshot.repos.iter().find(|r| r.identity() == identity) {
        Some(record) => Ok(Json(record.clone())),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Repository not found: {}/{}", owner, name),
            }),
        )),
    }
}
