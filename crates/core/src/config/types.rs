use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub collector: Option<CollectorConfig>,
    #[serde(default)]
    pub browser: BrowserConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Catalog read-path configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Bundled JSON snapshot - the portable source of truth.
    pub snapshot_path: PathBuf,
    /// Optional SQLite mirror. When unset the read path serves the bundled
    /// snapshot only.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// How long a resolved snapshot is served without re-reading (seconds).
    #[serde(default = "default_freshness_secs")]
    pub freshness_secs: u64,
    /// Bound on a single mirror read (seconds).
    #[serde(default = "default_db_timeout_secs")]
    pub db_timeout_secs: u64,
}

fn default_freshness_secs() -> u64 {
    300
}

fn default_db_timeout_secs() -> u64 {
    5
}

/// Hosting API client configuration, shared by the collector and the
/// source browser.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// API token. Optional, but unauthenticated search quotas are small.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u32,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: None,
            per_page: default_per_page(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_per_page() -> u32 {
    100
}

fn default_timeout_secs() -> u32 {
    30
}

/// Discovery run configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollectorConfig {
    #[serde(default)]
    pub github: GithubConfig,
    /// Keyword templates issued as search queries, in order.
    pub keywords: Vec<String>,
    /// Star floor appended to every query as a qualifier (0 = none).
    #[serde(default)]
    pub min_stars: u32,
    #[serde(default = "default_max_pages")]
    pub max_pages_per_query: u32,
    #[serde(default = "default_rpm")]
    pub requests_per_minute: u32,
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: PathBuf,
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
}

fn default_max_pages() -> u32 {
    10
}

fn default_rpm() -> u32 {
    30
}

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from("collector_checkpoint.json")
}

fn default_log_path() -> PathBuf {
    PathBuf::from("discovery_log.json")
}

/// Source browser configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserConfig {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u32,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    #[serde(default = "default_max_file_kb")]
    pub max_file_kb: u64,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    /// Directories scanned before falling back to the repository root.
    #[serde(default = "default_priority_dirs")]
    pub priority_dirs: Vec<String>,
    /// Recognized source file extensions (no leading dot).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_archive_base_url")]
    pub archive_base_url: String,
    /// Tried in order only when the default-branch lookup fails.
    #[serde(default = "default_branch_guesses")]
    pub branch_guesses: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            github: GithubConfig::default(),
            cache_ttl_hours: default_cache_ttl_hours(),
            max_files: default_max_files(),
            max_file_kb: default_max_file_kb(),
            max_depth: default_max_depth(),
            priority_dirs: default_priority_dirs(),
            extensions: default_extensions(),
            archive_base_url: default_archive_base_url(),
            branch_guesses: default_branch_guesses(),
        }
    }
}

fn default_cache_ttl_hours() -> u32 {
    24
}

fn default_max_files() -> usize {
    20
}

fn default_max_file_kb() -> u64 {
    100
}

fn default_max_depth() -> u32 {
    3
}

fn default_priority_dirs() -> Vec<String> {
    ["src", "programs", "contracts", "program", "anchor"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_extensions() -> Vec<String> {
    ["rs", "ts", "tsx", "js", "jsx", "sol", "move", "py", "go", "c", "h", "toml", "json"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_archive_base_url() -> String {
    "https://github.com".to_string()
}

fn default_branch_guesses() -> Vec<String> {
    ["main", "master", "dev", "develop"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collector: Option<SanitizedCollectorConfig>,
    pub browser: SanitizedBrowserConfig,
}

/// Sanitized collector config (API token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCollectorConfig {
    pub api_url: String,
    pub token_configured: bool,
    pub keywords: Vec<String>,
    pub min_stars: u32,
    pub requests_per_minute: u32,
}

/// Sanitized browser config (API token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedBrowserConfig {
    pub api_url: String,
    pub token_configured: bool,
    pub cache_ttl_hours: u32,
    pub max_files: usize,
    pub max_file_kb: u64,
    pub max_depth: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            catalog: config.catalog.clone(),
            collector: config.collector.as_ref().map(|c| SanitizedCollectorConfig {
                api_url: c.github.api_url.clone(),
                token_configured: c.github.token.is_some(),
                keywords: c.keywords.clone(),
                min_stars: c.min_stars,
                requests_per_minute: c.requests_per_minute,
            }),
            browser: SanitizedBrowserConfig {
                api_url: config.browser.github.api_url.clone(),
                token_configured: config.browser.github.token.is_some(),
                cache_ttl_hours: config.browser.cache_ttl_hours,
                max_files: config.browser.max_files,
                max_file_kb: config.browser.max_file_kb,
                max_depth: config.browser.max_depth,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let toml = r#"
[catalog]
snapshot_path = "catalog.json"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.catalog.freshness_secs, 300);
        assert_eq!(config.catalog.db_timeout_secs, 5);
        assert!(config.catalog.database_path.is_none());
        assert!(config.collector.is_none());
        assert_eq!(config.browser.cache_ttl_hours, 24);
    }

    #[test]
    fn test_deserialize_missing_catalog_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[catalog]
snapshot_path = "/data/catalog.json"
database_path = "/data/mirror.db"
freshness_secs = 60

[collector]
keywords = ["solana program", "anchor framework"]
min_stars = 10
requests_per_minute = 12

[collector.github]
token = "ghp_secret"
per_page = 50

[browser]
cache_ttl_hours = 12
max_files = 10
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(
            config.catalog.database_path.as_ref().unwrap().to_str().unwrap(),
            "/data/mirror.db"
        );

        let collector = config.collector.as_ref().unwrap();
        assert_eq!(collector.keywords.len(), 2);
        assert_eq!(collector.min_stars, 10);
        assert_eq!(collector.github.token.as_deref(), Some("ghp_secret"));
        assert_eq!(collector.github.per_page, 50);
        assert_eq!(collector.github.timeout_secs, 30); // default
        assert_eq!(collector.max_pages_per_query, 10); // default

        assert_eq!(config.browser.cache_ttl_hours, 12);
        assert_eq!(config.browser.max_files, 10);
        assert_eq!(config.browser.max_depth, 3); // default
    }

    #[test]
    fn test_browser_defaults() {
        let browser = BrowserConfig::default();
        assert_eq!(browser.priority_dirs[0], "src");
        assert!(browser.extensions.iter().any(|e| e == "rs"));
        assert_eq!(browser.branch_guesses[0], "main");
        assert_eq!(browser.archive_base_url, "https://github.com");
    }

    #[test]
    fn test_sanitized_config_redacts_tokens() {
        let toml = r#"
[catalog]
snapshot_path = "catalog.json"

[collector]
keywords = ["solana"]

[collector.github]
token = "ghp_secret"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);

        let collector = sanitized.collector.as_ref().unwrap();
        assert!(collector.token_configured);
        assert!(!sanitized.browser.token_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("ghp_secret"));
    }
}
