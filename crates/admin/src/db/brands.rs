//! Brand repository.

use catalog_core::{BrandId, HexColor, Slug};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, QueryBuilder};

use super::{ListQuery, Page, RepositoryError, map_write_error, push_conditions, push_order_and_page};
use crate::components::data_table::DataTableConfig;
use crate::models::{Brand, BrandInput};

const COLUMNS: &str = "b.id, b.name, b.slug, b.url, b.description, b.is_visible, b.primary_hex, \
                       b.created_at, b.updated_at";

#[derive(Debug, sqlx::FromRow)]
struct BrandRow {
    id: i32,
    name: String,
    slug: String,
    url: String,
    description: Option<String>,
    is_visible: bool,
    primary_hex: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BrandRow> for Brand {
    type Error = RepositoryError;

    fn try_from(row: BrandRow) -> Result<Self, Self::Error> {
        let slug = Slug::try_from(row.slug)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid brand slug: {e}")))?;
        let primary_hex = row
            .primary_hex
            .map(HexColor::try_from)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid brand color: {e}")))?;

        Ok(Self {
            id: BrandId::new(row.id),
            name: row.name,
            slug,
            url: row.url,
            description: row.description,
            is_visible: row.is_visible,
            primary_hex,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for brand database operations.
pub struct BrandRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BrandRepository<'a> {
    /// Create a new brand repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a live brand by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get(&self, id: BrandId) -> Result<Option<Brand>, RepositoryError> {
        let row = sqlx::query_as::<_, BrandRow>(&format!(
            "SELECT {COLUMNS} FROM catalog.brands b WHERE b.id = $1 AND b.deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List brands for the index table.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list(
        &self,
        table: &DataTableConfig,
        query: &ListQuery,
    ) -> Result<Page<Brand>, RepositoryError> {
        let mut count =
            QueryBuilder::new("SELECT COUNT(*) FROM catalog.brands b WHERE b.deleted_at IS NULL");
        push_conditions(&mut count, table, query);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        let mut select = QueryBuilder::new(format!(
            "SELECT {COLUMNS} FROM catalog.brands b WHERE b.deleted_at IS NULL"
        ));
        push_conditions(&mut select, table, query);
        push_order_and_page(&mut select, table, query, "b.id");
        let rows = select.build_query_as::<BrandRow>().fetch_all(self.pool).await?;

        Ok(Page {
            items: rows
                .into_iter()
                .map(TryInto::try_into)
                .collect::<Result<_, _>>()?,
            total,
            page: query.page,
            per_page: query.per_page,
        })
    }

    /// Insert a brand.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a unique column is taken.
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &BrandInput) -> Result<Brand, RepositoryError> {
        let row = sqlx::query_as::<_, BrandRow>(&format!(
            r"
            INSERT INTO catalog.brands AS b (name, slug, url, description, is_visible, primary_hex)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUMNS}
            "
        ))
        .bind(&input.name)
        .bind(input.slug.as_str())
        .bind(&input.url)
        .bind(input.description.as_deref())
        .bind(input.is_visible)
        .bind(input.primary_hex.as_ref().map(HexColor::as_str))
        .fetch_one(self.pool)
        .await
        .map_err(map_write_error)?;

        row.try_into()
    }

    /// Update a live brand.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the brand does not exist.
    /// Returns `RepositoryError::Conflict` if a unique column is taken.
    pub async fn update(&self, id: BrandId, input: &BrandInput) -> Result<Brand, RepositoryError> {
        let row = sqlx::query_as::<_, BrandRow>(&format!(
            r"
            UPDATE catalog.brands AS b
            SET name = $2, slug = $3, url = $4, description = $5, is_visible = $6,
                primary_hex = $7, updated_at = NOW()
            WHERE b.id = $1 AND b.deleted_at IS NULL
            RETURNING {COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.name)
        .bind(input.slug.as_str())
        .bind(&input.url)
        .bind(input.description.as_deref())
        .bind(input.is_visible)
        .bind(input.primary_hex.as_ref().map(HexColor::as_str))
        .fetch_optional(self.pool)
        .await
        .map_err(map_write_error)?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Soft-delete brands. Returns the number of brands trashed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn soft_delete(&self, ids: &[i32]) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE catalog.brands
            SET deleted_at = NOW()
            WHERE id = ANY($1) AND deleted_at IS NULL
            ",
        )
        .bind(ids)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// `(id, name)` pairs of live brands for pickers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn options(&self) -> Result<Vec<(i32, String)>, RepositoryError> {
        let options = sqlx::query_as::<_, (i32, String)>(
            "SELECT id, name FROM catalog.brands WHERE deleted_at IS NULL ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(options)
    }
}
