//! Common test utilities for in-process API testing.
//!
//! Builds the real router over a temp-dir snapshot and a mock contents
//! host, so handlers are exercised end to end without network access or a
//! listening socket.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use prometheus::Registry;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use chaindex_core::testing::MockContentsHost;
use chaindex_core::{
    BrowserConfig, CatalogConfig, CatalogResolver, CatalogSnapshot, Category, Config,
    JsonCatalogStore, ProgramRecord, ServerConfig, SourceBrowser,
};
use chaindex_server::api::create_router;
use chaindex_server::state::AppState;

/// In-process server fixture with a scripted contents host.
pub struct TestFixture {
    pub router: Router,
    pub contents: Arc<MockContentsHost>,
    #[allow(dead_code)]
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Minimal well-formed record for seeding fixtures.
pub fn record(full_name: &str, stars: u32, category: Category) -> ProgramRecord {
    let (owner, name) = full_name.split_once('/').expect("owner/name");
    let now = chrono::Utc::now();
    ProgramRecord {
        full_name: full_name.to_string(),
        owner: owner.to_string(),
        name: name.to_string(),
        url: format!("https://github.com/{}", full_name),
        description: Some(format!("{} test repository", name)),
        stars,
        language: Some("Rust".to_string()),
        topics: vec!["solana".to_string()],
        updated_at: now,
        default_branch: "main".to_string(),
        category,
        sub_category: None,
        flagged: false,
        first_seen_at: now,
        last_merged_at: now,
    }
}

impl TestFixture {
    /// Fixture over a small default catalog.
    pub async fn new() -> Self {
        Self::with_records(vec![
            record("jup-ag/jupiter-core", 500, Category::Exchange),
            record("team/lend-o-matic", 50, Category::Lending),
            record("someone/odds-and-ends", 5, Category::Infrastructure),
        ])
        .await
    }

    /// Fixture over a caller-provided catalog.
    pub async fn with_records(records: Vec<ProgramRecord>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let snapshot_path = temp_dir.path().join("catalog.json");

        let store = JsonCatalogStore::new(snapshot_path.clone());
        store
            .save(&CatalogSnapshot::new(
                records,
                vec!["solana program".to_string()],
            ))
            .expect("Failed to seed snapshot");

        let config = Config {
            server: ServerConfig::default(),
            catalog: CatalogConfig {
                snapshot_path,
                database_path: None,
                freshness_secs: 300,
                db_timeout_secs: 5,
            },
            collector: None,
            browser: BrowserConfig::default(),
        };

        let resolver = Arc::new(
            CatalogResolver::from_store(
                &store,
                None,
                Duration::from_secs(config.catalog.freshness_secs),
                Duration::from_secs(config.catalog.db_timeout_secs),
            )
            .expect("Failed to build resolver"),
        );

        let contents = Arc::new(MockContentsHost::new());
        let browser = Arc::new(SourceBrowser::new(
            contents.clone(),
            config.browser.clone(),
        ));

        let registry = Registry::new();
        // Core metrics are process-global statics; registering them into a
        // second fixture's registry is fine.
        let _ = chaindex_core::metrics::register_all(&registry);

        let state = Arc::new(AppState::new(config, resolver, browser, None, registry));
        let router = create_router(state);

        Self {
            router,
            contents,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    /// Send a GET request and return the raw body as text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).to_string())
    }
}
