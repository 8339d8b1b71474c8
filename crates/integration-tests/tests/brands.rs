//! Integration tests for brand management through the generic resource routes.
//!
//! Requires a running admin server backed by a migrated database.

use catalog_integration_tests::{admin_base_url, client, create_record, form, unique_suffix};
use reqwest::{Client, StatusCode};

/// Create a brand with an explicit name and slug.
async fn create_named_brand(client: &Client, name: &str, slug: &str) -> i32 {
    let url = format!("https://{slug}.example.com");
    create_record(
        client,
        "/brands/create",
        form(&[
            ("name", name),
            ("slug", slug),
            ("url", &url),
            ("description", "Integration test brand"),
            ("is_visible", "0"),
            ("is_visible", "1"),
            ("primary_hex", "#1d4ed8"),
        ]),
    )
    .await
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_brand_create_edit_delete() {
    let client = client();
    let base_url = admin_base_url();
    let suffix = unique_suffix();
    let name = format!("Integration Brand {suffix}");
    let slug = format!("integration-brand-{suffix}");

    let id = create_named_brand(&client, &name, &slug).await;

    // Listed on the index
    let body = client
        .get(format!("{base_url}/brands?search={suffix}"))
        .send()
        .await
        .expect("Failed to list brands")
        .text()
        .await
        .expect("Failed to read body");
    assert!(body.contains(&name));

    // Edit page carries the stored values
    let resp = client
        .get(format!("{base_url}/brands/{id}/edit"))
        .send()
        .await
        .expect("Failed to load edit page");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.expect("Failed to read body").contains(&slug));

    // Delete, then the record is gone from view
    let resp = client
        .post(format!("{base_url}/brands/{id}/delete"))
        .send()
        .await
        .expect("Failed to delete brand");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = client
        .get(format!("{base_url}/brands/{id}"))
        .send()
        .await
        .expect("Failed to load deleted brand");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_brand_validation_errors_rerender_form() {
    let resp = client()
        .post(format!("{}/brands/create", admin_base_url()))
        .multipart(form(&[
            ("name", ""),
            ("slug", ""),
            ("url", "not a url"),
            ("is_visible", "0"),
        ]))
        .send()
        .await
        .expect("Failed to post invalid brand");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.expect("Failed to read body");
    assert!(body.contains("The name field is required."));
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_brand_duplicate_name_is_rejected() {
    let client = client();
    let suffix = unique_suffix();
    let name = format!("Duplicate Brand {suffix}");
    create_named_brand(&client, &name, &format!("duplicate-brand-{suffix}")).await;

    let resp = client
        .post(format!("{}/brands/create", admin_base_url()))
        .multipart(form(&[
            ("name", &name),
            ("slug", &format!("duplicate-brand-other-{suffix}")),
            ("url", &format!("https://other-{suffix}.example.com")),
            ("is_visible", "0"),
        ]))
        .send()
        .await
        .expect("Failed to post duplicate brand");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.expect("Failed to read body");
    assert!(body.contains("has already been taken"));
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_brand_name_change_derives_slug() {
    let resp = client()
        .post(format!("{}/brands/form/refresh", admin_base_url()))
        .multipart(form(&[
            ("_operation", "create"),
            ("_changed", "name"),
            ("name", "Fjord Audio & Co"),
            ("slug", ""),
            ("url", ""),
            ("is_visible", "0"),
        ]))
        .send()
        .await
        .expect("Failed to refresh brand form");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read body");
    assert!(body.contains("fjord-audio-co"));
}
