//! `PostgreSQL` answers to form validation questions.

use catalog_core::CategoryId;
use sqlx::PgPool;

use super::{CategoryRepository, RepositoryError};
use crate::resource::RelationSource;
use crate::resource::lookup::ValidationLookup;
use crate::resource::rules::UniqueRule;

/// [`ValidationLookup`] over the catalog schema.
///
/// Table and column names come from resource descriptors, never from
/// requests; values are always bound.
#[derive(Debug, Clone, Copy)]
pub struct PgLookup<'a> {
    pool: &'a PgPool,
}

impl<'a> PgLookup<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl ValidationLookup for PgLookup<'_> {
    async fn is_taken(
        &self,
        rule: UniqueRule,
        value: &str,
        ignore: Option<i32>,
    ) -> Result<bool, RepositoryError> {
        // Trashed rows still hold their unique values.
        let taken = sqlx::query_scalar::<_, bool>(&format!(
            "SELECT EXISTS (SELECT 1 FROM catalog.{} WHERE {} = $1 AND ($2::int IS NULL OR id <> $2))",
            rule.table, rule.column
        ))
        .bind(value)
        .bind(ignore)
        .fetch_one(self.pool)
        .await?;

        Ok(taken)
    }

    async fn exists(&self, source: RelationSource, id: i32) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(&format!(
            "SELECT EXISTS (SELECT 1 FROM catalog.{} WHERE id = $1 AND deleted_at IS NULL)",
            source.table()
        ))
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    async fn category_ancestors(&self, id: i32) -> Result<Vec<i32>, RepositoryError> {
        CategoryRepository::new(self.pool)
            .ancestors(CategoryId::new(id))
            .await
    }
}
