//! Integration tests for the catalog admin.
//!
//! The tests talk to a running admin server over HTTP and are ignored by
//! default.
//!
//! # Running Tests
//!
//! ```bash
//! catalog-cli migrate
//! cargo run -p catalog-admin &
//! cargo test -p catalog-integration-tests -- --ignored
//! ```
//!
//! Set `ADMIN_BASE_URL` to target a server other than `http://localhost:3001`.

use rand::Rng;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode, header};

/// Base URL for the admin server.
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// HTTP client that does not follow redirects, so tests can assert on them.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// A random suffix that keeps names and slugs unique across runs.
#[must_use]
pub fn unique_suffix() -> String {
    format!("{:08x}", rand::rng().random::<u32>())
}

/// Build a multipart form from text pairs, the way the admin forms post.
#[must_use]
pub fn form(fields: &[(&str, &str)]) -> Form {
    fields.iter().fold(Form::new(), |form, (name, value)| {
        form.text((*name).to_string(), (*value).to_string())
    })
}

/// Extract the record id from a `/{resource}/{id}/edit` redirect location.
#[must_use]
pub fn id_from_location(location: &str) -> Option<i32> {
    location
        .split('?')
        .next()?
        .trim_end_matches("/edit")
        .rsplit('/')
        .next()?
        .parse()
        .ok()
}

/// A one-pixel PNG for image fields.
const PIXEL_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f, 0x15, 0xc4,
    0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae,
    0x42, 0x60, 0x82,
];

/// Attach a PNG file part named `field`.
///
/// # Panics
///
/// Panics if the mime type is rejected.
#[must_use]
pub fn with_image(form: Form, field: &str) -> Form {
    let part = Part::bytes(PIXEL_PNG)
        .file_name("pixel.png")
        .mime_str("image/png")
        .expect("Valid mime type");
    form.part(field.to_string(), part)
}

/// Post a create form and return the new record id from the redirect.
///
/// # Panics
///
/// Panics if the request fails or the server does not redirect to the
/// new record's edit page.
pub async fn create_record(client: &Client, path: &str, form: Form) -> i32 {
    let resp = client
        .post(format!("{}{path}", admin_base_url()))
        .multipart(form)
        .send()
        .await
        .expect("Failed to post create form");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER, "create {path} should redirect");
    let location = resp
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("Create should set a location");
    assert!(location.ends_with("?notice=created"));
    id_from_location(location).expect("Redirect should point at the edit page")
}

/// Create a visible brand and return its id.
pub async fn create_brand(client: &Client, suffix: &str) -> i32 {
    let name = format!("Integration Brand {suffix}");
    let slug = format!("integration-brand-{suffix}");
    let url = format!("https://{slug}.example.com");
    create_record(
        client,
        "/brands/create",
        form(&[
            ("name", &name),
            ("slug", &slug),
            ("url", &url),
            ("is_visible", "0"),
            ("is_visible", "1"),
        ]),
    )
    .await
}

/// Create a product under `brand_id` and return its id.
pub async fn create_product(client: &Client, brand_id: i32, suffix: &str, price: &str) -> i32 {
    let name = format!("Integration Product {suffix}");
    let slug = format!("integration-product-{suffix}");
    let sku = format!("IT-{suffix}");
    let brand = brand_id.to_string();
    let fields = form(&[
        ("name", &name),
        ("slug", &slug),
        ("sku", &sku),
        ("price", price),
        ("quantity", "5"),
        ("type", "deliverable"),
        ("is_visible", "0"),
        ("is_featured", "0"),
        ("brand_id", &brand),
        ("categories[]", ""),
    ]);
    create_record(client, "/products/create", with_image(fields, "image")).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_location() {
        assert_eq!(id_from_location("/brands/42/edit?notice=created"), Some(42));
        assert_eq!(id_from_location("/brands/7/edit"), Some(7));
        assert_eq!(id_from_location("/brands?notice=deleted"), None);
    }
}
