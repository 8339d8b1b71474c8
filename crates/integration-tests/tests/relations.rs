//! Integration tests for relation managers on brand and category edit pages.
//!
//! Requires a running admin server backed by a migrated database.

use catalog_integration_tests::{
    admin_base_url, client, create_brand, create_product, create_record, form, unique_suffix,
    with_image,
};
use reqwest::StatusCode;

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_brand_products_manager_links_new_product() {
    let client = client();
    let base_url = admin_base_url();
    let suffix = unique_suffix();
    let brand_id = create_brand(&client, &suffix).await;

    let name = format!("Managed Product {suffix}");
    let slug = format!("managed-product-{suffix}");
    let sku = format!("MP-{suffix}");
    let fields = form(&[
        ("name", &name),
        ("slug", &slug),
        ("sku", &sku),
        ("price", "19.99"),
        ("quantity", "3"),
        ("is_visible", "0"),
        ("is_featured", "0"),
        ("categories[]", ""),
    ]);
    let resp = client
        .post(format!("{base_url}/brands/{brand_id}/products/create"))
        .multipart(with_image(fields, "image"))
        .send()
        .await
        .expect("Failed to create related product");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let body = client
        .get(format!("{base_url}/brands/{brand_id}/edit"))
        .send()
        .await
        .expect("Failed to load brand edit page")
        .text()
        .await
        .expect("Failed to read body");
    assert!(body.contains(&name), "relation manager should list the new product");
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_foreign_product_is_not_a_member() {
    let client = client();
    let base_url = admin_base_url();
    let suffix = unique_suffix();
    let brand_id = create_brand(&client, &suffix).await;
    let other_brand = create_brand(&client, &format!("{suffix}-other")).await;
    let product_id = create_product(&client, other_brand, &suffix, "5.00").await;

    let resp = client
        .get(format!("{base_url}/brands/{brand_id}/products/{product_id}/edit"))
        .send()
        .await
        .expect("Failed to load related edit page");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_category_products_manager_attaches_through_pivot() {
    let client = client();
    let base_url = admin_base_url();
    let suffix = unique_suffix();
    let category_name = format!("Integration Category {suffix}");
    let category_slug = format!("integration-category-{suffix}");
    let category_id = create_record(
        &client,
        "/categories/create",
        form(&[
            ("name", &category_name),
            ("slug", &category_slug),
            ("parent_id", ""),
            ("is_visible", "0"),
            ("is_visible", "1"),
        ]),
    )
    .await;
    let brand_id = create_brand(&client, &suffix).await;

    let name = format!("Pivot Product {suffix}");
    let slug = format!("pivot-product-{suffix}");
    let sku = format!("PP-{suffix}");
    let brand = brand_id.to_string();
    let fields = form(&[
        ("name", &name),
        ("slug", &slug),
        ("sku", &sku),
        ("price", "7.25"),
        ("quantity", "1"),
        ("is_visible", "0"),
        ("is_featured", "0"),
        ("brand_id", &brand),
    ]);
    let resp = client
        .post(format!("{base_url}/categories/{category_id}/products/create"))
        .multipart(with_image(fields, "image"))
        .send()
        .await
        .expect("Failed to create related product");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let body = client
        .get(format!("{base_url}/categories/{category_id}/edit"))
        .send()
        .await
        .expect("Failed to load category edit page")
        .text()
        .await
        .expect("Failed to read body");
    assert!(body.contains(&name));
}
