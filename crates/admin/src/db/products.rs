//! Product repository.
//!
//! Category links live in `catalog.category_product` and are replaced
//! wholesale on every write.

use catalog_core::{BrandId, CategoryId, Price, ProductId, ProductType, Slug};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, QueryBuilder};

use super::{ListQuery, Page, RepositoryError, map_write_error, push_conditions, push_order_and_page};
use crate::components::data_table::DataTableConfig;
use crate::models::{Product, ProductInput};
use crate::resource::PriceBook;

const FROM: &str = r"
    FROM catalog.products p
    JOIN catalog.brands b ON b.id = p.brand_id
    WHERE p.deleted_at IS NULL";

const COLUMNS: &str = r"
    SELECT p.id, p.brand_id, b.name AS brand_name, p.name, p.slug, p.sku, p.image,
           p.description, p.quantity, p.price, p.is_visible, p.is_featured, p.type,
           p.published_at, p.created_at, p.updated_at";

/// Restricts a product listing to the products of one parent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductScope {
    Brand(BrandId),
    Category(CategoryId),
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    brand_id: i32,
    brand_name: Option<String>,
    name: String,
    slug: String,
    sku: String,
    image: Option<String>,
    description: Option<String>,
    quantity: i32,
    price: Decimal,
    is_visible: bool,
    is_featured: bool,
    #[sqlx(rename = "type")]
    product_type: Option<ProductType>,
    published_at: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let slug = Slug::try_from(row.slug)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid product slug: {e}")))?;

        Ok(Self {
            id: ProductId::new(row.id),
            brand_id: BrandId::new(row.brand_id),
            brand_name: row.brand_name,
            name: row.name,
            slug,
            sku: row.sku,
            image: row.image,
            description: row.description,
            quantity: row.quantity,
            price: Price::from_decimal(row.price),
            is_visible: row.is_visible,
            is_featured: row.is_featured,
            product_type: row.product_type,
            published_at: row.published_at,
            category_ids: Vec::new(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn push_scope(builder: &mut QueryBuilder<'_, sqlx::Postgres>, scope: Option<ProductScope>) {
    match scope {
        Some(ProductScope::Brand(brand_id)) => {
            builder.push(" AND p.brand_id = ");
            builder.push_bind(brand_id);
        }
        Some(ProductScope::Category(category_id)) => {
            builder.push(
                " AND EXISTS (SELECT 1 FROM catalog.category_product cp \
                 WHERE cp.product_id = p.id AND cp.category_id = ",
            );
            builder.push_bind(category_id);
            builder.push(")");
        }
        None => {}
    }
}

async fn sync_categories(
    conn: &mut PgConnection,
    product_id: i32,
    category_ids: &[CategoryId],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM catalog.category_product WHERE product_id = $1")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    let ids: Vec<i32> = category_ids.iter().map(CategoryId::as_i32).collect();
    sqlx::query(
        r"
        INSERT INTO catalog.category_product (category_id, product_id)
        SELECT DISTINCT category_id, $2 FROM UNNEST($1::int[]) AS category_id
        ",
    )
    .bind(ids.as_slice())
    .bind(product_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a live product with its category ids.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, ProductRow>(&format!("{COLUMNS} {FROM} AND p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
        else {
            return Ok(None);
        };

        let mut product = Product::try_from(row)?;
        product.category_ids = sqlx::query_scalar::<_, i32>(
            r"
            SELECT cp.category_id
            FROM catalog.category_product cp
            JOIN catalog.categories c ON c.id = cp.category_id AND c.deleted_at IS NULL
            WHERE cp.product_id = $1
            ORDER BY c.name
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(CategoryId::new)
        .collect();

        Ok(Some(product))
    }

    /// List products for an index table, optionally scoped to a parent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list(
        &self,
        table: &DataTableConfig,
        query: &ListQuery,
        scope: Option<ProductScope>,
    ) -> Result<Page<Product>, RepositoryError> {
        let mut count = QueryBuilder::new(format!("SELECT COUNT(*) {FROM}"));
        push_scope(&mut count, scope);
        push_conditions(&mut count, table, query);
        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        let mut select = QueryBuilder::new(format!("{COLUMNS} {FROM}"));
        push_scope(&mut select, scope);
        push_conditions(&mut select, table, query);
        push_order_and_page(&mut select, table, query, "p.id");
        let rows = select
            .build_query_as::<ProductRow>()
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

    /// Insert a product and its category links.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug or SKU is taken.
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO catalog.products (
                brand_id, name, slug, sku, image, description, quantity, price,
                is_visible, is_featured, type, published_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            ",
        )
        .bind(input.brand_id)
        .bind(&input.name)
        .bind(input.slug.as_str())
        .bind(&input.sku)
        .bind(input.image.as_deref())
        .bind(input.description.as_deref())
        .bind(input.quantity)
        .bind(input.price.amount())
        .bind(input.is_visible)
        .bind(input.is_featured)
        .bind(input.product_type)
        .bind(input.published_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        sync_categories(&mut *tx, id, &input.category_ids).await?;
        tx.commit().await?;

        self.get(ProductId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Update a live product and replace its category links.
    ///
    /// A `None` image keeps the stored one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if the slug or SKU is taken.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE catalog.products
            SET brand_id = $2, name = $3, slug = $4, sku = $5, image = COALESCE($6, image),
                description = $7, quantity = $8, price = $9, is_visible = $10,
                is_featured = $11, type = $12, published_at = $13, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .bind(input.brand_id)
        .bind(&input.name)
        .bind(input.slug.as_str())
        .bind(&input.sku)
        .bind(input.image.as_deref())
        .bind(input.description.as_deref())
        .bind(input.quantity)
        .bind(input.price.amount())
        .bind(input.is_visible)
        .bind(input.is_featured)
        .bind(input.product_type)
        .bind(input.published_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sync_categories(&mut *tx, id.as_i32(), &input.category_ids).await?;
        tx.commit().await?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete products. Returns the number of products trashed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn soft_delete(&self, ids: &[i32]) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE catalog.products
            SET deleted_at = NOW()
            WHERE id = ANY($1) AND deleted_at IS NULL
            ",
        )
        .bind(ids)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// `(id, name)` pairs of live products for pickers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn options(&self) -> Result<Vec<(i32, String)>, RepositoryError> {
        let options = sqlx::query_as::<_, (i32, String)>(
            "SELECT id, name FROM catalog.products WHERE deleted_at IS NULL ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(options)
    }

    /// Current prices of the given live products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn price_book(&self, ids: &[i32]) -> Result<PriceBook, RepositoryError> {
        let prices = sqlx::query_as::<_, (i32, Decimal)>(
            "SELECT id, price FROM catalog.products WHERE id = ANY($1) AND deleted_at IS NULL",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        Ok(prices.into_iter().collect())
    }
}
