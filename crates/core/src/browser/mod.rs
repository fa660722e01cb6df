//! On-demand source code viewer.
//!
//! Scans a repository's tree through the hosting contents API (priority
//! directories first, bounded depth and file count), fetches raw file
//! contents and caches the whole result per repository for 24 hours.
//! "Repository has no viewable code" is an in-band outcome, distinct from a
//! transport failure.

mod cache;
mod contents;

pub use cache::TtlCache;
pub use contents::{ContentsHost, GithubContents};

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Duration;
use tracing::{debug, warn};

use crate::config::BrowserConfig;
use crate::metrics;

/// A directory entry as reported by the contents API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Dir,
    Other(String),
}

/// One fetched source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeFile {
    pub path: String,
    pub size_bytes: u64,
    pub content: String,
}

/// A tree entry retained for display (no content).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub kind: EntryKind,
    pub size_bytes: u64,
}

/// The assembled per-repository result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoCode {
    pub files: Vec<CodeFile>,
    pub file_tree: Vec<TreeEntry>,
    pub fetched_at: DateTime<Utc>,
}

/// Outcome of a code fetch. `NoCode` is expected behavior (empty repository,
/// nothing under the size/extension limits), not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum CodeOutcome {
    Available(RepoCode),
    NoCode,
}

/// Errors from the source browser. All of these mean the fetch itself
/// failed and may succeed on retry.
#[derive(Debug, Error)]
pub enum BrowseError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request timeout")]
    Timeout,
}

/// Source browser with an injected contents host and its own TTL cache.
pub struct SourceBrowser {
    host: Arc<dyn ContentsHost>,
    cache: TtlCache<Arc<CodeOutcome>>,
    config: BrowserConfig,
}

impl SourceBrowser {
    pub fn new(host: Arc<dyn ContentsHost>, config: BrowserConfig) -> Self {
        let cache = TtlCache::new(Duration::from_secs(
            u64::from(config.cache_ttl_hours) * 3600,
        ));
        Self {
            host,
            cache,
            config,
        }
    }

    /// Fetch (or serve from cache) the viewable source of a repository.
    pub async fn fetch_repo_code(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Arc<CodeOutcome>, BrowseError> {
        let key = format!("{}-{}-code", owner.to_lowercase(), repo.to_lowercase());

        if let Some(cached) = self.cache.get(&key).await {
            metrics::BROWSER_FETCHES.with_label_values(&["hit"]).inc();
            debug!(owner = owner, repo = repo, "Serving code from cache");
            return Ok(cached);
        }

        let timer = metrics::BROWSER_SCAN_DURATION
            .with_label_values(&[])
            .start_timer();
        let result = self.scan(owner, repo).await;
        timer.observe_duration();

        match result {
            Ok(outcome) => {
                let label = match outcome {
                    CodeOutcome::Available(_) => "fetched",
                    CodeOutcome::NoCode => "no_code",
                };
                metrics::BROWSER_FETCHES.with_label_values(&[label]).inc();
                let outcome = Arc::new(outcome);
                self.cache.insert(key, Arc::clone(&outcome)).await;
                Ok(outcome)
            }
            Err(e) => {
                metrics::BROWSER_FETCHES.with_label_values(&["error"]).inc();
                Err(e)
            }
        }
    }

    /// Archive download URL for a repository.
    ///
    /// The declared default branch is authoritative; the guess list is only
    /// consulted when that lookup itself fails.
    pub async fn archive_url(&self, owner: &str, repo: &str) -> String {
        let branch = match self.host.default_branch(owner, repo).await {
            Ok(branch) => branch,
            Err(e) => {
                warn!(owner = owner, repo = repo, error = %e, "Default branch lookup failed");
                self.guess_branch(owner, repo).await
            }
        };
        format!(
            "{}/{}/{}/archive/refs/heads/{}.zip",
            self.config.archive_base_url.trim_end_matches('/'),
            owner,
            repo,
            branch
        )
    }

    async fn guess_branch(&self, owner: &str, repo: &str) -> String {
        for guess in &self.config.branch_guesses {
            match self.host.branch_exists(owner, repo, guess).await {
                Ok(true) => return guess.clone(),
                Ok(false) => continue,
                Err(_) => continue,
            }
        }
        self.config
            .branch_guesses
            .first()
            .cloned()
            .unwrap_or_else(|| "main".to_string())
    }

    async fn scan(&self, owner: &str, repo: &str) -> Result<CodeOutcome, BrowseError> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut tree: Vec<TreeEntry> = Vec::new();
        let mut candidates: Vec<DirEntry> = Vec::new();

        for dir in &self.config.priority_dirs {
            if candidates.len() >= self.config.max_files {
                break;
            }
            self.scan_dir(
                owner,
                repo,
                dir.clone(),
                0,
                &mut visited,
                &mut tree,
                &mut candidates,
            )
            .await?;
        }

        // Nothing under the priority directories: fall back to the root.
        if candidates.is_empty() {
            self.scan_dir(
                owner,
                repo,
                String::new(),
                0,
                &mut visited,
                &mut tree,
                &mut candidates,
            )
            .await?;
        }

        if candidates.is_empty() {
            debug!(owner = owner, repo = repo, "No viewable files in repository");
            return Ok(CodeOutcome::NoCode);
        }

        let mut files: Vec<CodeFile> = Vec::new();
        for entry in candidates.iter().take(self.config.max_files) {
            let Some(url) = entry.download_url.as_ref() else {
                continue;
            };
            match self.host.fetch_raw(url).await {
                Ok(content) => files.push(CodeFile {
                    path: entry.path.clone(),
                    size_bytes: entry.size_bytes,
                    content,
                }),
                Err(e) => {
                    // One bad file never sinks the whole fetch.
                    warn!(path = %entry.path, error = %e, "Skipping unfetchable file");
                }
            }
        }

        if files.is_empty() {
            return Ok(CodeOutcome::NoCode);
        }

        Ok(CodeOutcome::Available(RepoCode {
            files,
            file_tree: tree,
            fetched_at: Utc::now(),
        }))
    }

    #[allow(clippy::too_many_arguments)]
    fn scan_dir<'a>(
        &'a self,
        owner: &'a str,
        repo: &'a str,
        path: String,
        depth: u32,
        visited: &'a mut HashSet<String>,
        tree: &'a mut Vec<TreeEntry>,
        candidates: &'a mut Vec<DirEntry>,
    ) -> BoxFuture<'a, Result<(), BrowseError>> {
        Box::pin(async move {
            if depth >= self.config.max_depth || candidates.len() >= self.config.max_files {
                return Ok(());
            }
            if !visited.insert(path.clone()) {
                return Ok(());
            }

            let entries = match self.host.list_dir(owner, repo, &path).await {
                Ok(entries) => entries,
                // A missing priority directory is normal; a missing root
                // means the repository itself is gone.
                Err(BrowseError::NotFound(_)) if !path.is_empty() => return Ok(()),
                Err(e) => return Err(e),
            };

            for entry in entries {
                match entry.kind {
                    EntryKind::Dir => {
                        if !visited.contains(&entry.path) {
                            tree.push(TreeEntry {
                                path: entry.path.clone(),
                                kind: EntryKind::Dir,
                                size_bytes: 0,
                            });
                        }
                        self.scan_dir(
                            owner,
                            repo,
                            entry.path,
                            depth + 1,
                            visited,
                            tree,
                            candidates,
                        )
                        .await?;
                    }
                    EntryKind::File => {
                        tree.push(TreeEntry {
                            path: entry.path.clone(),
                            kind: EntryKind::File,
                            size_bytes: entry.size_bytes,
                        });
                        if candidates.len() < self.config.max_files && self.is_candidate(&entry) {
                            candidates.push(entry);
                        }
                    }
                    EntryKind::Other(_) => {}
                }
            }
            Ok(())
        })
    }

    fn is_candidate(&self, entry: &DirEntry) -> bool {
        if entry.size_bytes == 0 || entry.size_bytes > self.config.max_file_kb * 1024 {
            return false;
        }
        if entry.download_url.is_none() {
            return false;
        }
        match entry.name.rsplit_once('.') {
            Some((_, ext)) => self
                .config
                .extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }
}
