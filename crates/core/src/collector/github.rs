//! GitHub search API backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex_lite::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::GithubConfig;
use crate::metrics;

use super::{CollectError, RepoSource, SourcePage, SourceRepo};

/// Search result pages are capped by the API at this size.
const MAX_PER_PAGE: u32 = 100;

/// GitHub repository search backend.
pub struct GithubSource {
    client: Client,
    config: GithubConfig,
    next_link: Regex,
}

impl GithubSource {
    /// Create a new source. Fails only on a malformed token value.
    pub fn new(config: GithubConfig) -> Result<Self, CollectError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("chaindex"));
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| CollectError::AccessDenied(format!("invalid token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .default_headers(headers)
            .build()
            .map_err(|e| CollectError::Connection(e.to_string()))?;

        // <https://api.github.com/...&page=2>; rel="next"
        let next_link = Regex::new(r#"<[^>]+>;\s*rel="next""#)
            .map_err(|e| CollectError::Parse(e.to_string()))?;

        Ok(Self {
            client,
            config,
            next_link,
        })
    }

    fn build_search_url(&self, query: &str, page: u32) -> String {
        format!(
            "{}/search/repositories?q={}&sort=stars&order=desc&per_page={}&page={}",
            self.config.api_url.trim_end_matches('/'),
            urlencoding::encode(query),
            self.config.per_page.min(MAX_PER_PAGE),
            page
        )
    }
}

#[async_trait]
impl RepoSource for GithubSource {
    fn name(&self) -> &str {
        "github"
    }

    async fn search_page(&self, query: &str, page: u32) -> Result<SourcePage, CollectError> {
        let url = self.build_search_url(query, page);
        debug!(query = query, page = page, "Searching hosting API");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                CollectError::Timeout
            } else if e.is_connect() {
                CollectError::Connection(e.to_string())
            } else {
                CollectError::Api {
                    status: 0,
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();

        // 403 with an exhausted quota is the rate-limit stop condition; any
        // other 403 is a plain permission failure.
        if status == 403 || status == 429 {
            let remaining = response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            if status == 429 || remaining == Some(0) {
                metrics::COLLECTOR_API_REQUESTS
                    .with_label_values(&["rate_limited"])
                    .inc();
                return Err(CollectError::RateLimited);
            }
            metrics::COLLECTOR_API_REQUESTS
                .with_label_values(&["error"])
                .inc();
            return Err(CollectError::AccessDenied(format!("HTTP {}", status)));
        }
        if status == 404 {
            return Err(CollectError::NotFound(url));
        }
        if status == 401 {
            return Err(CollectError::AccessDenied("bad credentials".to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            metrics::COLLECTOR_API_REQUESTS
                .with_label_values(&["error"])
                .inc();
            return Err(CollectError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let has_next = response
            .headers()
            .get("link")
            .and_then(|v| v.to_str().ok())
            .map(|link| self.next_link.is_match(link))
            .unwrap_or(false);

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| CollectError::Parse(e.to_string()))?;

        metrics::COLLECTOR_API_REQUESTS
            .with_label_values(&["ok"])
            .inc();
        debug!(
            query = query,
            page = page,
            results = search.items.len(),
            total = search.total_count,
            "Search page fetched"
        );

        let repos = search.items.into_iter().map(SourceRepo::from).collect();
        Ok(SourcePage { repos, has_next })
    }
}

// GitHub API response types
#[derive(Debug, Deserialize)]
struct SearchResponse {
    total_count: u64,
    #[serde(default)]
    #[allow(dead_code)]
    incomplete_results: bool,
    items: Vec<RepoItem>,
}

#[derive(Debug, Deserialize)]
struct RepoItem {
    full_name: String,
    name: String,
    owner: RepoOwner,
    html_url: String,
    description: Option<String>,
    stargazers_count: u32,
    language: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
    pushed_at: Option<String>,
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepoOwner {
    login: String,
}

impl From<RepoItem> for SourceRepo {
    fn from(item: RepoItem) -> Self {
        let updated_at = item
            .pushed_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        SourceRepo {
            full_name: item.full_name,
            owner: item.owner.login,
            name: item.name,
            url: item.html_url,
            description: item.description,
            stars: item.stargazers_count,
            language: item.language,
            topics: item.topics,
            updated_at,
            default_branch: item.default_branch,
        }
    }
}
