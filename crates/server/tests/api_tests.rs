//! End-to-end API tests over the in-process router.

mod common;

use axum::http::StatusCode;
use chaindex_core::Category;
use common::{record, TestFixture};

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_is_sanitized() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["server"]["port"], 8080);
    // The browser section reports token presence, never the token.
    assert_eq!(response.body["browser"]["token_configured"], false);
}

#[tokio::test]
async fn test_catalog_lists_all_records() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/catalog").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total"], 3);
    assert_eq!(response.body["entries"].as_array().unwrap().len(), 3);
    // No mirror configured: the bundled snapshot serves the request.
    assert_eq!(response.body["source"], "bundled");
}

#[tokio::test]
async fn test_catalog_default_sort_is_stars_descending() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/catalog").await;

    let entries = response.body["entries"].as_array().unwrap();
    let stars: Vec<u64> = entries
        .iter()
        .map(|e| e["stars"].as_u64().unwrap())
        .collect();
    let mut sorted = stars.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(stars, sorted);
}

#[tokio::test]
async fn test_catalog_search_matches_one() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/catalog?q=jupiter").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total"], 1);
    assert_eq!(
        response.body["entries"][0]["full_name"],
        "jup-ag/jupiter-core"
    );
}

#[tokio::test]
async fn test_catalog_filter_by_category() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/catalog?category=lending").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total"], 1);
    assert_eq!(response.body["entries"][0]["category"], "lending");
}

#[tokio::test]
async fn test_catalog_unknown_category_is_bad_request() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/catalog?category=bogus").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("Unknown category"));
}

#[tokio::test]
async fn test_catalog_star_range_and_limit() {
    let fixture = TestFixture::with_records(vec![
        record("a/one", 10, Category::Infrastructure),
        record("b/two", 20, Category::Infrastructure),
        record("c/three", 30, Category::Infrastructure),
        record("d/four", 40, Category::Infrastructure),
    ])
    .await;

    let response = fixture
        .get("/api/v1/catalog?min_stars=15&max_stars=45&limit=2")
        .await;

    assert_eq!(response.status, StatusCode::OK);
    // Three match; the limit trims the entries but not the total.
    assert_eq!(response.body["total"], 3);
    let entries = response.body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["stars"], 40);
}

#[tokio::test]
async fn test_catalog_sort_by_name() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/catalog?sort=name").await;

    let entries = response.body["entries"].as_array().unwrap();
    assert_eq!(entries[0]["name"], "jupiter-core");
    assert_eq!(entries[2]["name"], "odds-and-ends");
}

#[tokio::test]
async fn test_catalog_stats() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/catalog/stats").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total_repos"], 3);
    assert_eq!(response.body["total_stars"], 555);
}

#[tokio::test]
async fn test_get_repo_found_case_insensitive() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/repos/JUP-AG/Jupiter-Core").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["full_name"], "jup-ag/jupiter-core");
}

#[tokio::test]
async fn test_get_repo_missing_is_not_found_outcome() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/repos/nobody/nothing").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("not found"));
}

#[tokio::test]
async fn test_code_endpoint_returns_files() {
    let fixture = TestFixture::new().await;
    fixture.contents.add_files(&[(
        "src/lib.rs".to_string(),
        512,
        "pub mod state;".to_string(),
    )]);

    let response = fixture.get("/api/v1/repos/jup-ag/jupiter-core/code").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["no_code"], false);
    let files = response.body["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["path"], "src/lib.rs");
    assert_eq!(files[0]["content"], "pub mod state;");
}

#[tokio::test]
async fn test_code_endpoint_empty_repo_is_no_code_not_error() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/repos/jup-ag/jupiter-core/code").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["no_code"], true);
    assert_eq!(response.body["files"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_code_endpoint_missing_repo_is_404() {
    let fixture = TestFixture::new().await;
    fixture.contents.fail_all_listings();

    let response = fixture.get("/api/v1/repos/gone/repo/code").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_code_endpoint_served_from_cache_on_second_call() {
    let fixture = TestFixture::new().await;
    fixture
        .contents
        .add_files(&[("src/lib.rs".to_string(), 512, "fn main() {}".to_string())]);

    fixture.get("/api/v1/repos/o/r/code").await;
    let listings = fixture.contents.list_calls();

    let response = fixture.get("/api/v1/repos/o/r/code").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(fixture.contents.list_calls(), listings);
}

#[tokio::test]
async fn test_archive_endpoint_uses_default_branch() {
    let fixture = TestFixture::new().await;
    fixture.contents.set_default_branch("master");

    let response = fixture.get("/api/v1/repos/jup-ag/jupiter-core/archive").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["url"],
        "https://github.com/jup-ag/jupiter-core/archive/refs/heads/master.zip"
    );
}

#[tokio::test]
async fn test_discovery_log_absent_is_404() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/discovery/log").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_prometheus_text() {
    let fixture = TestFixture::new().await;
    // Touch the resolver so at least one counter is non-zero.
    fixture.get("/api/v1/catalog").await;

    let (status, body) = fixture.get_text("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("chaindex_resolver_loads_total"));
}
