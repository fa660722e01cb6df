//! Source viewer API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use chaindex_core::{BrowseError, CodeFile, CodeOutcome, TreeEntry};

use crate::state::AppState;

use super::catalog::ErrorResponse;

#[derive(Debug, Serialize)]
pub struct CodeResponse {
    /// True when the repository has no viewable files. Distinct from a
    /// fetch failure, which returns an error status instead.
    pub no_code: bool,
    pub files: Vec<CodeFile>,
    pub file_tree: Vec<TreeEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ArchiveResponse {
    pub url: String,
}

/// GET /api/v1/repos/{owner}/{name}/code
pub async fn get_code(
    State(state): State<Arc<AppState>>,
    Path((owner, name)): Path<(String, String)>,
) -> Result<Json<CodeResponse>, impl IntoResponse> {
    match state.browser().fetch_repo_code(&owner, &name).await {
        Ok(outcome) => match outcome.as_ref() {
            CodeOutcome::Available(code) => Ok(Json(CodeResponse {
                no_code: false,
                files: code.files.clone(),
                file_tree: code.file_tree.clone(),
                fetched_at: Some(code.fetched_at),
            })),
            CodeOutcome::NoCode => Ok(Json(CodeResponse {
                no_code: true,
                files: Vec::new(),
                file_tree: Vec::new(),
                fetched_at: None,
            })),
        },
        Err(BrowseError::NotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Repository not found: {}/{}", owner, name),
            }),
        )),
        // Transport failures are retryable and surfaced as such.
        Err(e) => Err((
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: format!("Code fetch failed, retry later: {}", e),
            }),
        )),
    }
}

/// GET /api/v1/repos/{owner}/{name}/archive
pub async fn get_archive(
    State(state): State<Arc<AppState>>,
    Path((owner, name)): Path<(String, String)>,
) -> Json<ArchiveResponse> {
    let url = state.browser().archive_url(&owner, &name).await;
    Json(ArchiveResponse { url })
}
