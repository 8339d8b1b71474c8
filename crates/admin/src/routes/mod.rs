//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                   - Health check
//! GET  /health/ready                             - Readiness (database ping)
//!
//! # Dashboard
//! GET  /                                         - Dashboard widgets
//!
//! # Resources (brands, categories, products, orders)
//! GET  /{resource}                               - Index table
//! GET  /{resource}/create                        - Create form
//! POST /{resource}/create                        - Submit create
//! GET  /{resource}/{id}                          - Read-only view
//! GET  /{resource}/{id}/edit                     - Edit form with relation managers
//! POST /{resource}/{id}/edit                     - Submit edit
//! POST /{resource}/{id}/delete                   - Soft delete
//! POST /{resource}/bulk                          - Bulk delete or export
//! POST /{resource}/form/refresh                  - Field change, returns the form body
//!
//! # Relation managers
//! GET  /{resource}/{id}/{relation}/create        - Related create form
//! POST /{resource}/{id}/{relation}/create        - Submit related create
//! GET  /{resource}/{id}/{relation}/{rid}/edit    - Related edit form
//! POST /{resource}/{id}/{relation}/{rid}/edit    - Submit related edit
//! POST /{resource}/{id}/{relation}/{rid}/delete  - Delete related record
//!
//! # Uploads
//! GET  /storage/*                                - Uploaded attachments
//! ```

pub mod dashboard;
pub mod export;
pub mod multipart;
pub mod params;
pub mod relations;
pub mod resources;
pub mod views;

use askama::Template;
use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use catalog_core::OrderStatus;
use tower_http::services::ServeDir;

use crate::db::StatsRepository;
use crate::error::AppError;
use crate::resource::panel::BadgeSource;
use crate::resource::{Badge, ResourceDescriptor};
use crate::state::AppState;

use views::NavGroupView;

/// Upload size limit for form posts.
const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Build the admin router.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/", get(dashboard::index))
        .route("/{resource}", get(resources::index))
        .route(
            "/{resource}/create",
            get(resources::create).post(resources::store),
        )
        .route("/{resource}/bulk", post(resources::bulk))
        .route("/{resource}/form/refresh", post(resources::refresh))
        .route("/{resource}/{id}", get(resources::show))
        .route(
            "/{resource}/{id}/edit",
            get(resources::edit).post(resources::update),
        )
        .route("/{resource}/{id}/delete", post(resources::destroy))
        .route(
            "/{resource}/{id}/{relation}/create",
            get(relations::create).post(relations::store),
        )
        .route(
            "/{resource}/{id}/{relation}/{related_id}/edit",
            get(relations::edit).post(relations::update),
        )
        .route(
            "/{resource}/{id}/{relation}/{related_id}/delete",
            post(relations::destroy),
        )
        .nest_service("/storage", ServeDir::new(state.config().storage_dir.clone()))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Readiness check: the database answers.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => (StatusCode::OK, "ready"),
        Err(e) => {
            tracing::error!("Readiness check failed: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    }
}

/// Layout values shared by every page.
#[derive(Debug, Clone)]
pub struct Shell {
    pub title: String,
    pub nav: Vec<NavGroupView>,
    pub notice: Option<&'static str>,
}

impl Shell {
    /// Load the navigation (with badge counts) for a page at `current`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if a badge count fails.
    pub async fn load(
        state: &AppState,
        current: &str,
        title: impl Into<String>,
    ) -> Result<Self, AppError> {
        let groups = state.panel().navigation();
        let needs_processing = groups
            .iter()
            .flat_map(|g| &g.entries)
            .any(|e| e.item.badge == Some(BadgeSource::ProcessingOrders));
        let processing = if needs_processing {
            StatsRepository::new(state.pool())
                .order_count(OrderStatus::Processing)
                .await?
        } else {
            0
        };
        let nav = views::navigation(&groups, current, |source| match source {
            BadgeSource::ProcessingOrders => Some(Badge::processing_orders(processing)),
        });
        Ok(Self {
            title: title.into(),
            nav,
            notice: None,
        })
    }

    /// Show a confirmation banner for a `notice` query value.
    #[must_use]
    pub fn with_notice(mut self, notice: Option<&str>) -> Self {
        self.notice = match notice {
            Some("created") => Some("Created"),
            Some("saved") => Some("Saved"),
            Some("deleted") => Some("Deleted"),
            _ => None,
        };
        self
    }
}

/// Render a template.
///
/// # Errors
///
/// Returns `AppError::Render` if the template fails.
pub fn render(template: &impl Template) -> Result<Html<String>, AppError> {
    template.render().map(Html).map_err(|e| {
        tracing::error!("Template render error: {}", e);
        AppError::Render(e)
    })
}

/// Resolve a resource from its URL segment.
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unregistered resource.
pub fn resource<'a>(state: &'a AppState, slug: &str) -> Result<&'a ResourceDescriptor, AppError> {
    state
        .panel()
        .resource(slug)
        .ok_or_else(|| AppError::NotFound(format!("resource '{slug}'")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use axum::body::Body;
    use axum::http::Request;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::AdminConfig;
    use crate::resource::SlugPolicy;
    use crate::resources;

    /// Router over a lazy pool that never connects.
    fn app() -> Router {
        let config = AdminConfig {
            database_url: SecretString::from("postgres://localhost/catalog_test".to_string()),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            storage_dir: PathBuf::from("storage/public"),
            slug_policy: SlugPolicy::Always,
            page_size: 10,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
            tls: None,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/catalog_test")
            .unwrap();
        let state = AppState::new(config, pool, resources::panel(SlugPolicy::Always).unwrap());
        routes(&state).with_state(state)
    }

    async fn status(uri: &str, method: &str) -> StatusCode {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_health_is_ok() {
        assert_eq!(status("/health", "GET").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_resource_is_not_found() {
        assert_eq!(status("/invoices", "GET").await, StatusCode::NOT_FOUND);
        assert_eq!(status("/invoices/create", "GET").await, StatusCode::NOT_FOUND);
        assert_eq!(status("/invoices/1/edit", "GET").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_relation_is_not_found() {
        assert_eq!(
            status("/orders/1/products/create", "GET").await,
            StatusCode::NOT_FOUND
        );
    }
}
