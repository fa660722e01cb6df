//! Discovery run visibility.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use chaindex_core::{read_discovery_log, DiscoveryLog};

use crate::state::AppState;

use super::catalog::ErrorResponse;

/// GET /api/v1/discovery/log
///
/// The most recent collection run's log, if any run has happened.
pub async fn get_log(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DiscoveryLog>, (StatusCode, Json<ErrorResponse>)> {
    let log = state
        .discovery_log_path()
        .and_then(|path| read_discovery_log(path));

    match log {
        Some(log) => Ok(Json(log)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No discovery run recorded".to_string(),
            }),
        )),
    }
}
