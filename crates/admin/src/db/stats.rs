//! Aggregates for dashboard widgets and navigation badges.

use catalog_core::OrderStatus;
use sqlx::PgPool;

use super::RepositoryError;

/// Repository for dashboard statistics.
pub struct StatsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatsRepository<'a> {
    /// Create a new stats repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Number of live customers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn customer_count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM catalog.customers WHERE deleted_at IS NULL",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Number of live products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM catalog.products WHERE deleted_at IS NULL",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Number of live orders in `status`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn order_count(&self, status: OrderStatus) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM catalog.orders WHERE status = $1 AND deleted_at IS NULL",
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// `(month, count)` of live products created in `year`, months 1-12,
    /// omitting months without products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn products_per_month(&self, year: i32) -> Result<Vec<(i32, i64)>, RepositoryError> {
        let counts = sqlx::query_as::<_, (i32, i64)>(
            r"
            SELECT EXTRACT(MONTH FROM created_at)::int AS month, COUNT(*)
            FROM catalog.products
            WHERE deleted_at IS NULL AND EXTRACT(YEAR FROM created_at)::int = $1
            GROUP BY month
            ORDER BY month
            ",
        )
        .bind(year)
        .fetch_all(self.pool)
        .await?;

        Ok(counts)
    }
}
