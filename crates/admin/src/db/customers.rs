//! Customer repository.
//!
//! Customers are not edited in the panel; orders only pick them.

use catalog_core::CustomerId;
use sqlx::PgPool;

use super::{RepositoryError, map_write_error};
use crate::models::Customer;

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    name: String,
    email: String,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: CustomerId::new(row.id),
            name: row.name,
            email: row.email,
        }
    }
}

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// `(id, name)` pairs of live customers for pickers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn options(&self) -> Result<Vec<(i32, String)>, RepositoryError> {
        let options = sqlx::query_as::<_, (i32, String)>(
            "SELECT id, name FROM catalog.customers WHERE deleted_at IS NULL ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(options)
    }

    /// Insert a customer, or return the existing one with the same email.
    ///
    /// Used by the seed command.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn upsert(&self, name: &str, email: &str) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            INSERT INTO catalog.customers (name, email)
            VALUES ($1, $2)
            ON CONFLICT ON CONSTRAINT customers_email_key
            DO UPDATE SET name = EXCLUDED.name, updated_at = NOW()
            RETURNING id, name, email
            ",
        )
        .bind(name)
        .bind(email)
        .fetch_one(self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(row.into())
    }
}
