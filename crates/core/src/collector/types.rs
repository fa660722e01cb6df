//! Types for the repository collection system.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A repository as returned by the hosting search API, before
/// classification and merging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRepo {
    pub full_name: String,
    pub owner: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub stars: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
}

/// One page of search results.
#[derive(Debug, Clone)]
pub struct SourcePage {
    pub repos: Vec<SourceRepo>,
    /// Whether the API advertises a further page.
    pub has_next: bool,
}

/// Errors from the collection path.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Quota exhausted. Stop condition for the current run, not a process
    /// failure: the runner checkpoints and exits cleanly.
    #[error("Rate limited by hosting API")]
    RateLimited,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Request timeout")]
    Timeout,
}

/// Trait for repository search backends.
#[async_trait]
pub trait RepoSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &str;

    /// Fetch one page of search results for a free-text query.
    /// Pages are 1-based.
    async fn search_page(&self, query: &str, page: u32) -> Result<SourcePage, CollectError>;
}
