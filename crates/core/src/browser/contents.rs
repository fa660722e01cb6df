//! GitHub contents API client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::GithubConfig;

use super::{BrowseError, DirEntry, EntryKind};

/// Read access to a hosted repository's tree and raw file contents.
#[async_trait]
pub trait ContentsHost: Send + Sync {
    /// List a directory. `path` is repo-relative; empty string is the root.
    async fn list_dir(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<DirEntry>, BrowseError>;

    /// Fetch a file's raw content by its download URL.
    async fn fetch_raw(&self, url: &str) -> Result<String, BrowseError>;

    /// The repository's declared default branch.
    async fn default_branch(&self, owner: &str, repo: &str) -> Result<String, BrowseError>;

    /// Whether a branch exists. Used only as a fallback when the default
    /// branch lookup fails.
    async fn branch_exists(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<bool, BrowseError>;
}

/// Contents host backed by the GitHub REST API.
pub struct GithubContents {
    client: Client,
    api_url: String,
}

impl GithubContents {
    pub fn new(config: &GithubConfig) -> Result<Self, BrowseError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("chaindex"));
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| BrowseError::Api {
                    status: 0,
                    message: format!("invalid token: {}", e),
                })?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .default_headers(headers)
            .build()
            .map_err(|e| BrowseError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, BrowseError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                BrowseError::Timeout
            } else if e.is_connect() {
                BrowseError::Connection(e.to_string())
            } else {
                BrowseError::Api {
                    status: 0,
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status == 404 {
            return Err(BrowseError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BrowseError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ContentsHost for GithubContents {
    async fn list_dir(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<DirEntry>, BrowseError> {
        let url = if path.is_empty() {
            format!("{}/repos/{}/{}/contents", self.api_url, owner, repo)
        } else {
            format!("{}/repos/{}/{}/contents/{}", self.api_url, owner, repo, path)
        };
        debug!(owner = owner, repo = repo, path = path, "Listing directory");

        let response = self.get(&url).await?;
        let contents: ContentsResponse = response
            .json()
            .await
            .map_err(|e| BrowseError::Parse(e.to_string()))?;

        let raw = match contents {
            ContentsResponse::Entries(entries) => entries,
            // A file path returns a single descriptor; surface it as a
            // one-entry listing.
            ContentsResponse::Single(entry) => vec![entry],
        };

        Ok(raw.into_iter().map(DirEntry::from).collect())
    }

    async fn fetch_raw(&self, url: &str) -> Result<String, BrowseError> {
        let response = self.get(url).await?;
        response
            .text()
            .await
            .map_err(|e| BrowseError::Parse(e.to_string()))
    }

    async fn default_branch(&self, owner: &str, repo: &str) -> Result<String, BrowseError> {
        let url = format!("{}/repos/{}/{}", self.api_url, owner, repo);
        let response = self.get(&url).await?;
        let repo_info: RepoInfo = response
            .json()
            .await
            .map_err(|e| BrowseError::Parse(e.to_string()))?;
        Ok(repo_info.default_branch)
    }

    async fn branch_exists(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<bool, BrowseError> {
        let url = format!(
            "{}/repos/{}/{}/branches/{}",
            self.api_url, owner, repo, branch
        );
        match self.get(&url).await {
            Ok(_) => Ok(true),
            Err(BrowseError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

// GitHub API response types
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Entries(Vec<ContentsEntry>),
    Single(ContentsEntry),
}

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: u64,
    download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    default_branch: String,
}

impl From<ContentsEntry> for DirEntry {
    fn from(entry: ContentsEntry) -> Self {
        let kind = match entry.kind.as_str() {
            "dir" => EntryKind::Dir,
            "file" => EntryKind::File,
            other => EntryKind::Other(other.to_string()),
        };
        DirEntry {
            name: entry.name,
            path: entry.path,
            kind,
            size_bytes: entry.size,
            download_url: entry.download_url,
        }
    }
}
