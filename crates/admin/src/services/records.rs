//! Typed persistence behind the generic resource routes.
//!
//! Routes work with [`FormState`] and [`TableRecord`]; this service maps a
//! [`ResourceKind`] to its repository and model conversions.

use catalog_core::{BrandId, CategoryId, OrderId, ProductId};
use sqlx::PgPool;
use thiserror::Error;

use crate::db::{
    BrandRepository, CategoryRepository, CustomerRepository, ListQuery, OrderRepository, Page,
    ProductRepository, ProductScope, RepositoryError,
};
use crate::models::{
    BrandInput, CategoryInput, InputError, OrderInput, ProductInput, TableRecord,
};
use crate::resource::{FormState, PriceBook, RelationSource, ResourceDescriptor, ResourceKind};

/// Errors persisting a dehydrated form.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The validated state does not fit the model.
    #[error("invalid form payload: {0}")]
    Input(#[from] InputError),
}

/// Scope of a relation listing under `parent`.
#[must_use]
pub const fn product_scope(parent: ResourceKind, parent_id: i32) -> Option<ProductScope> {
    match parent {
        ResourceKind::Brands => Some(ProductScope::Brand(BrandId::new(parent_id))),
        ResourceKind::Categories => Some(ProductScope::Category(CategoryId::new(parent_id))),
        ResourceKind::Products | ResourceKind::Orders => None,
    }
}

/// Resource-kind dispatch over the repositories.
pub struct Records<'a> {
    pool: &'a PgPool,
}

impl<'a> Records<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Stored form state of a live record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn load_state(
        &self,
        kind: ResourceKind,
        id: i32,
    ) -> Result<Option<FormState>, RepositoryError> {
        let state = match kind {
            ResourceKind::Brands => BrandRepository::new(self.pool)
                .get(BrandId::new(id))
                .await?
                .map(|b| b.to_state()),
            ResourceKind::Categories => CategoryRepository::new(self.pool)
                .get(CategoryId::new(id))
                .await?
                .map(|c| c.to_state()),
            ResourceKind::Products => ProductRepository::new(self.pool)
                .get(ProductId::new(id))
                .await?
                .map(|p| p.to_state()),
            ResourceKind::Orders => OrderRepository::new(self.pool)
                .get(OrderId::new(id))
                .await?
                .map(|o| o.to_state()),
        };
        Ok(state)
    }

    /// One page of table rows. `scope` only narrows product listings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn list(
        &self,
        resource: &ResourceDescriptor,
        query: &ListQuery,
        scope: Option<ProductScope>,
    ) -> Result<Page<TableRecord>, RepositoryError> {
        let table = &resource.table;
        let page = match resource.kind {
            ResourceKind::Brands => BrandRepository::new(self.pool)
                .list(table, query)
                .await?
                .map(|b| b.table_record()),
            ResourceKind::Categories => CategoryRepository::new(self.pool)
                .list(table, query)
                .await?
                .map(|c| c.table_record()),
            ResourceKind::Products => ProductRepository::new(self.pool)
                .list(table, query, scope)
                .await?
                .map(|p| p.table_record()),
            ResourceKind::Orders => OrderRepository::new(self.pool)
                .list(table, query)
                .await?
                .map(|o| o.table_record()),
        };
        Ok(page)
    }

    /// Insert a record from a dehydrated state and return its id.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Input` if the state does not fit the model and
    /// `RecordError::Repository` if the insert fails.
    pub async fn create(&self, kind: ResourceKind, state: &FormState) -> Result<i32, RecordError> {
        let id = match kind {
            ResourceKind::Brands => {
                let input = BrandInput::from_state(state)?;
                BrandRepository::new(self.pool).create(&input).await?.id.as_i32()
            }
            ResourceKind::Categories => {
                let input = CategoryInput::from_state(state)?;
                CategoryRepository::new(self.pool)
                    .create(&input)
                    .await?
                    .id
                    .as_i32()
            }
            ResourceKind::Products => {
                let input = ProductInput::from_state(state)?;
                ProductRepository::new(self.pool)
                    .create(&input)
                    .await?
                    .id
                    .as_i32()
            }
            ResourceKind::Orders => {
                let input = OrderInput::from_state(state)?;
                OrderRepository::new(self.pool).create(&input).await?.id.as_i32()
            }
        };
        tracing::info!(resource = %kind, id, "Record created");
        Ok(id)
    }

    /// Update a record from a dehydrated state.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Input` if the state does not fit the model and
    /// `RecordError::Repository` if the update fails.
    pub async fn update(
        &self,
        kind: ResourceKind,
        id: i32,
        state: &FormState,
    ) -> Result<(), RecordError> {
        match kind {
            ResourceKind::Brands => {
                let input = BrandInput::from_state(state)?;
                BrandRepository::new(self.pool)
                    .update(BrandId::new(id), &input)
                    .await?;
            }
            ResourceKind::Categories => {
                let input = CategoryInput::from_state(state)?;
                CategoryRepository::new(self.pool)
                    .update(CategoryId::new(id), &input)
                    .await?;
            }
            ResourceKind::Products => {
                let input = ProductInput::from_state(state)?;
                ProductRepository::new(self.pool)
                    .update(ProductId::new(id), &input)
                    .await?;
            }
            ResourceKind::Orders => {
                let input = OrderInput::from_state(state)?;
                OrderRepository::new(self.pool)
                    .update(OrderId::new(id), &input)
                    .await?;
            }
        }
        tracing::info!(resource = %kind, id, "Record updated");
        Ok(())
    }

    /// Soft-delete records. Returns how many were trashed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the update fails.
    pub async fn delete(&self, kind: ResourceKind, ids: &[i32]) -> Result<u64, RepositoryError> {
        let deleted = match kind {
            ResourceKind::Brands => BrandRepository::new(self.pool).soft_delete(ids).await?,
            ResourceKind::Categories => CategoryRepository::new(self.pool).soft_delete(ids).await?,
            ResourceKind::Products => ProductRepository::new(self.pool).soft_delete(ids).await?,
            ResourceKind::Orders => OrderRepository::new(self.pool).soft_delete(ids).await?,
        };
        tracing::info!(resource = %kind, count = deleted, "Records deleted");
        Ok(deleted)
    }

    /// `(id, label)` choices for a relation picker. `exclude` drops one id
    /// (a category cannot be its own parent).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn options(
        &self,
        source: RelationSource,
        exclude: Option<i32>,
    ) -> Result<Vec<(i32, String)>, RepositoryError> {
        match source {
            RelationSource::Brands => BrandRepository::new(self.pool).options().await,
            RelationSource::Categories => {
                CategoryRepository::new(self.pool)
                    .options(exclude.map(CategoryId::new))
                    .await
            }
            RelationSource::Customers => CustomerRepository::new(self.pool).options().await,
            RelationSource::Products => ProductRepository::new(self.pool).options().await,
        }
    }

    /// Prices of the given products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn price_book(&self, product_ids: &[i32]) -> Result<PriceBook, RepositoryError> {
        if product_ids.is_empty() {
            return Ok(PriceBook::new());
        }
        ProductRepository::new(self.pool).price_book(product_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_scope() {
        assert_eq!(
            product_scope(ResourceKind::Brands, 3),
            Some(ProductScope::Brand(BrandId::new(3)))
        );
        assert_eq!(
            product_scope(ResourceKind::Categories, 4),
            Some(ProductScope::Category(CategoryId::new(4)))
        );
        assert_eq!(product_scope(ResourceKind::Orders, 1), None);
    }
}
