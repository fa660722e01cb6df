//! Types for the program catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::Category;

/// One cataloged repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramRecord {
    /// "owner/name". Identity compares case-insensitively.
    pub full_name: String,
    pub owner: String,
    pub name: String,
    /// Repository home page URL.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub stars: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    /// Last upstream activity.
    pub updated_at: DateTime<Utc>,
    /// "main" when unknown.
    #[serde(default = "default_branch")]
    pub default_branch: String,
    /// Assigned by the classifier; re-derived on every merge.
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    /// Operator-curated staleness flag. Collection never produces this, so
    /// merges preserve it.
    #[serde(default)]
    pub flagged: bool,
    pub first_seen_at: DateTime<Utc>,
    pub last_merged_at: DateTime<Utc>,
}

fn default_branch() -> String {
    "main".to_string()
}

impl ProgramRecord {
    /// Lowercase "owner/name" identity - the sole de-duplication key.
    pub fn identity(&self) -> String {
        self.full_name.to_lowercase()
    }

    /// A record is malformed when it lacks a usable identity. Malformed
    /// records are skipped by the merge, never inserted under a synthetic key.
    pub fn is_malformed(&self) -> bool {
        if self.owner.is_empty() || self.name.is_empty() {
            return true;
        }
        match self.full_name.split_once('/') {
            Some((owner, name)) => {
                owner.is_empty()
                    || name.is_empty()
                    || name.contains('/')
                    || !owner.eq_ignore_ascii_case(&self.owner)
                    || !name.eq_ignore_ascii_case(&self.name)
            }
            None => true,
        }
    }
}

/// The full record set plus provenance metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub scraped_at: DateTime<Utc>,
    /// Must equal `repos.len()`; violating documents are corrupt.
    pub total_repos: usize,
    #[serde(default)]
    pub keywords_searched: Vec<String>,
    pub repos: Vec<ProgramRecord>,
}

impl CatalogSnapshot {
    /// Snapshot over a record set, with the count invariant established.
    pub fn new(repos: Vec<ProgramRecord>, keywords_searched: Vec<String>) -> Self {
        Self {
            scraped_at: Utc::now(),
            total_repos: repos.len(),
            keywords_searched,
            repos,
        }
    }

    /// Empty snapshot, useful as a degenerate fallback in tests.
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// Check the count invariant.
    pub fn is_consistent(&self) -> bool {
        self.total_repos == self.repos.len()
    }
}

/// Record of the most recent collection pass. Overwritten per run; carries
/// no invariants beyond reflecting that run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryLog {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub queries: Vec<String>,
    pub new_records: u32,
    pub updated_records: u32,
    pub skipped_records: u32,
    #[serde(default)]
    pub errors: Vec<String>,
    /// Whether the run stopped early on quota exhaustion.
    #[serde(default)]
    pub rate_limited: bool,
}

/// Resumable position of a collection pass, persisted when a run halts on
/// rate limiting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub keyword_index: usize,
    pub page: u32,
}

/// Catalog statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_repos: u64,
    pub total_stars: u64,
    /// Distinct primary languages.
    pub unique_languages: u32,
    /// Records flagged for operator review.
    pub flagged: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<DateTime<Utc>>,
}

impl CatalogStats {
    pub fn from_snapshot(snapshot: &CatalogSnapshot) -> Self {
        let languages: std::collections::HashSet<String> = snapshot
            .repos
            .iter()
            .filter_map(|r| r.language.as_ref())
            .map(|l| l.to_lowercase())
            .collect();

        Self {
            total_repos: snapshot.repos.len() as u64,
            total_stars: snapshot.repos.iter().map(|r| r.stars as u64).sum(),
            unique_languages: languages.len() as u32,
            flagged: snapshot.repos.iter().filter(|r| r.flagged).count() as u64,
            scraped_at: Some(snapshot.scraped_at),
        }
    }
}

/// Errors for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Corrupt snapshot: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Schema mismatch: expected version {expected}, found {found}")]
    SchemaMismatch { expected: u32, found: u32 },

    #[error("Not found: {0}")]
    NotFound(String),
}
