//! Database operations for the catalog `PostgreSQL` schema.
//!
//! # Schema: `catalog`
//!
//! ## Tables
//!
//! - `customers` - Order customers (read-only from the panel)
//! - `brands` - Product brands
//! - `categories` - Nested product categories
//! - `products` - Catalog products
//! - `category_product` - Product/category links
//! - `orders` - Customer orders
//! - `order_items` - Order lines with a unit price snapshot
//!
//! Every table except the link tables is soft-deleted through `deleted_at`.
//! Listings and relation lookups skip trashed rows; unique constraints
//! cover all rows.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p catalog-cli -- migrate
//! ```

pub mod brands;
pub mod categories;
pub mod customers;
pub mod lookup;
pub mod orders;
pub mod products;
pub mod stats;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;

use crate::components::data_table::DataTableConfig;

pub use brands::BrandRepository;
pub use categories::CategoryRepository;
pub use customers::CustomerRepository;
pub use lookup::PgLookup;
pub use orders::OrderRepository;
pub use products::{ProductRepository, ProductScope};
pub use stats::StatsRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation, carrying the constraint name.
    #[error("constraint violation: {constraint}")]
    Conflict { constraint: String },
}

/// Map a write error, turning unique violations into [`RepositoryError::Conflict`].
pub(crate) fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict {
            constraint: db_err.constraint().unwrap_or_default().to_owned(),
        };
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Search, filter, sort and page parameters of an index table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub search: Option<String>,
    /// Column key; ignored unless the column is sortable.
    pub sort: Option<String>,
    pub descending: bool,
    /// `(filter key, value)`; unknown keys and values are ignored.
    pub filters: Vec<(String, String)>,
    /// 1-based.
    pub page: u32,
    pub per_page: u32,
}

impl ListQuery {
    fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }
}

/// One page of records.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }

    /// Number of the last page (at least 1).
    #[must_use]
    pub fn last_page(&self) -> u32 {
        if self.per_page == 0 || self.total <= 0 {
            return 1;
        }
        let pages = (self.total + i64::from(self.per_page) - 1) / i64::from(self.per_page);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }
}

/// Append ` AND ...` clauses for the search term and filters.
///
/// Only expressions declared by `table` are ever interpolated; every
/// operator-supplied value is bound.
pub(crate) fn push_conditions(
    builder: &mut QueryBuilder<'_, Postgres>,
    table: &DataTableConfig,
    query: &ListQuery,
) {
    if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let exprs = table.search_exprs();
        if !exprs.is_empty() {
            let pattern = format!("%{term}%");
            builder.push(" AND (");
            for (i, expr) in exprs.iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                builder.push(format!("{expr}::text ILIKE "));
                builder.push_bind(pattern.clone());
            }
            builder.push(")");
        }
    }

    for (key, value) in &query.filters {
        let Some(filter) = table.find_filter(key) else {
            continue;
        };
        if !filter.accepts(value) {
            continue;
        }
        builder.push(format!(" AND {}::text = ", filter.expr));
        builder.push_bind(value.clone());
    }
}

/// Append `ORDER BY`, `LIMIT` and `OFFSET`. `id_expr` breaks ties.
pub(crate) fn push_order_and_page(
    builder: &mut QueryBuilder<'_, Postgres>,
    table: &DataTableConfig,
    query: &ListQuery,
    id_expr: &str,
) {
    let (expr, descending) = match query.sort.as_deref().and_then(|key| table.sort_expr(key)) {
        Some(expr) => (Some(expr), query.descending),
        None => (
            table.default_sort.as_deref().and_then(|key| table.sort_expr(key)),
            table.default_sort_desc,
        ),
    };
    let direction = if descending { "DESC" } else { "ASC" };
    match expr {
        Some(expr) => builder.push(format!(" ORDER BY {expr} {direction}, {id_expr} {direction}")),
        None => builder.push(format!(" ORDER BY {id_expr} DESC")),
    };
    builder.push(" LIMIT ");
    builder.push_bind(i64::from(query.per_page));
    builder.push(" OFFSET ");
    builder.push_bind(query.offset());
}
