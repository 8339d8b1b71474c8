//! Integration tests for health endpoints and the dashboard.
//!
//! Requires a running admin server backed by a migrated database.

use catalog_integration_tests::{admin_base_url, client};
use reqwest::StatusCode;

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_health_returns_ok() {
    let resp = client()
        .get(format!("{}/health", admin_base_url()))
        .send()
        .await
        .expect("Failed to call health endpoint");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("Failed to read body"), "ok");
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_readiness_pings_database() {
    let resp = client()
        .get(format!("{}/health/ready", admin_base_url()))
        .send()
        .await
        .expect("Failed to call readiness endpoint");

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_dashboard_renders_navigation() {
    let resp = client()
        .get(format!("{}/", admin_base_url()))
        .send()
        .await
        .expect("Failed to load dashboard");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read body");
    for label in ["Brands", "Categories", "Products", "Orders"] {
        assert!(body.contains(label), "navigation should list {label}");
    }
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_unknown_resource_is_not_found() {
    let resp = client()
        .get(format!("{}/widgets-that-do-not-exist", admin_base_url()))
        .send()
        .await
        .expect("Failed to call unknown resource");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
