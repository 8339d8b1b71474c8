//! Integration tests for order line pricing and export.
//!
//! Requires a running admin server backed by a migrated database.

use catalog_integration_tests::{
    admin_base_url, client, create_brand, create_product, form, unique_suffix,
};
use reqwest::{StatusCode, header};

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_picking_a_product_prices_the_line() {
    let client = client();
    let suffix = unique_suffix();
    let brand_id = create_brand(&client, &suffix).await;
    let product_id = create_product(&client, brand_id, &suffix, "12.50").await.to_string();

    let resp = client
        .post(format!("{}/orders/form/refresh", admin_base_url()))
        .multipart(form(&[
            ("_operation", "create"),
            ("_changed", "items.0.product_id"),
            ("number", "OR-123456"),
            ("status", "pending"),
            ("shipping_price", "0"),
            ("items[0][product_id]", &product_id),
            ("items[0][quantity]", "2"),
            ("items[0][unit_price]", ""),
        ]))
        .send()
        .await
        .expect("Failed to refresh order form");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read body");
    assert!(body.contains("12.50"), "unit price should come from the product");
    assert!(body.contains("25.00"), "line total should be quantity times unit price");
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_refresh_with_huge_line_values_still_renders() {
    let resp = client()
        .post(format!("{}/orders/form/refresh", admin_base_url()))
        .multipart(form(&[
            ("_operation", "create"),
            ("_changed", "items.0.quantity"),
            ("items[0][quantity]", "2147483647"),
            ("items[0][unit_price]", "79228162514264337593543950335"),
        ]))
        .send()
        .await
        .expect("Failed to refresh order form");

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_add_row_action_appends_an_item() {
    let resp = client()
        .post(format!("{}/orders/form/refresh", admin_base_url()))
        .multipart(form(&[
            ("_operation", "create"),
            ("_action", "add:items"),
            ("items[]", ""),
        ]))
        .send()
        .await
        .expect("Failed to add a row");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read body");
    assert!(body.contains("items[0][quantity]"));
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_unknown_row_action_is_rejected() {
    let resp = client()
        .post(format!("{}/orders/form/refresh", admin_base_url()))
        .multipart(form(&[("_operation", "create"), ("_action", "add:nothing")]))
        .send()
        .await
        .expect("Failed to post row action");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_bulk_export_returns_csv() {
    let resp = client()
        .post(format!("{}/orders/bulk", admin_base_url()))
        .form(&[("action", "export"), ("ids", "2147483647")])
        .send()
        .await
        .expect("Failed to export orders");

    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/csv"));
    let body = resp.text().await.expect("Failed to read body");
    assert!(body.starts_with("Number,Customer,Status"));
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_brands_cannot_be_exported() {
    let resp = client()
        .post(format!("{}/brands/bulk", admin_base_url()))
        .form(&[("action", "export"), ("ids", "1")])
        .send()
        .await
        .expect("Failed to post bulk action");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
