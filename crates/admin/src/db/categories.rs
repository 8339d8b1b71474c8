//! Category repository.

use catalog_core::{CategoryId, Slug};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, QueryBuilder};

use super::{ListQuery, Page, RepositoryError, map_write_error, push_conditions, push_order_and_page};
use crate::components::data_table::DataTableConfig;
use crate::models::{Category, CategoryInput};

const SELECT: &str = r"
    SELECT c.id, c.parent_id, p.name AS parent_name, c.name, c.slug, c.description,
           c.is_visible, c.created_at, c.updated_at
    FROM catalog.categories c
    LEFT JOIN catalog.categories p ON p.id = c.parent_id AND p.deleted_at IS NULL
    WHERE c.deleted_at IS NULL";

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    parent_id: Option<i32>,
    parent_name: Option<String>,
    name: String,
    slug: String,
    description: Option<String>,
    is_visible: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CategoryRow> for Category {
    type Error = RepositoryError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        let slug = Slug::try_from(row.slug)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid category slug: {e}")))?;

        Ok(Self {
            id: CategoryId::new(row.id),
            parent_id: row.parent_id.map(CategoryId::new),
            parent_name: row.parent_name,
            name: row.name,
            slug,
            description: row.description,
            is_visible: row.is_visible,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a live category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!("{SELECT} AND c.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List categories for the index table.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list(
        &self,
        table: &DataTableConfig,
        query: &ListQuery,
    ) -> Result<Page<Category>, RepositoryError> {
        let mut count = QueryBuilder::new(
            r"
            SELECT COUNT(*)
            FROM catalog.categories c
            LEFT JOIN catalog.categories p ON p.id = c.parent_id AND p.deleted_at IS NULL
            WHERE c.deleted_at IS NULL",
        );
        push_conditions(&mut count, table, query);
        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        let mut select = QueryBuilder::new(SELECT);
        push_conditions(&mut select, table, query);
        push_order_and_page(&mut select, table, query, "c.id");
        let rows = select
            .build_query_as::<CategoryRow>()
            .fetch_all(self.pool)
            .await?;

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

    /// Insert a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name or slug is taken.
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &CategoryInput) -> Result<Category, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO catalog.categories (parent_id, name, slug, description, is_visible)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(input.parent_id)
        .bind(&input.name)
        .bind(input.slug.as_str())
        .bind(input.description.as_deref())
        .bind(input.is_visible)
        .fetch_one(self.pool)
        .await
        .map_err(map_write_error)?;

        self.get(CategoryId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Update a live category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    /// Returns `RepositoryError::Conflict` if the name or slug is taken.
    pub async fn update(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE catalog.categories
            SET parent_id = $2, name = $3, slug = $4, description = $5, is_visible = $6,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .bind(input.parent_id)
        .bind(&input.name)
        .bind(input.slug.as_str())
        .bind(input.description.as_deref())
        .bind(input.is_visible)
        .execute(self.pool)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete categories. Children keep their parent link.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn soft_delete(&self, ids: &[i32]) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE catalog.categories
            SET deleted_at = NOW()
            WHERE id = ANY($1) AND deleted_at IS NULL
            ",
        )
        .bind(ids)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// `(id, name)` pairs of live categories, without `exclude`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn options(
        &self,
        exclude: Option<CategoryId>,
    ) -> Result<Vec<(i32, String)>, RepositoryError> {
        let options = sqlx::query_as::<_, (i32, String)>(
            r"
            SELECT id, name FROM catalog.categories
            WHERE deleted_at IS NULL AND ($1::int IS NULL OR id <> $1)
            ORDER BY name
            ",
        )
        .bind(exclude)
        .fetch_all(self.pool)
        .await?;

        Ok(options)
    }

    /// Ancestor ids of a category, nearest first.
    ///
    /// Stops at the first repeated id so corrupt cyclic data cannot loop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ancestors(&self, id: CategoryId) -> Result<Vec<i32>, RepositoryError> {
        let ids = sqlx::query_scalar::<_, i32>(
            r"
            WITH RECURSIVE chain (id, parent_id, depth, path) AS (
                SELECT c.id, c.parent_id, 0, ARRAY[c.id]
                FROM catalog.categories c
                WHERE c.id = $1
                UNION ALL
                SELECT c.id, c.parent_id, chain.depth + 1, chain.path || c.id
                FROM catalog.categories c
                JOIN chain ON c.id = chain.parent_id
                WHERE NOT c.id = ANY(chain.path)
            )
            SELECT id FROM chain WHERE depth > 0 ORDER BY depth
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(ids)
    }
}
