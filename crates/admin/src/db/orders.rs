//! Order repository.
//!
//! Order lines are written in the same transaction as their order: lines
//! with an id are updated, new lines inserted and missing lines deleted.

use catalog_core::{CustomerId, OrderId, OrderItemId, OrderStatus, Price, ProductId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, QueryBuilder};

use super::{ListQuery, Page, RepositoryError, map_write_error, push_conditions, push_order_and_page};
use crate::components::data_table::DataTableConfig;
use crate::models::{Order, OrderInput, OrderItem, OrderItemInput};

const SELECT: &str = r"
    SELECT o.id, o.customer_id, c.name AS customer_name, o.number, o.status,
           o.shipping_price, o.notes, o.created_at, o.updated_at
    FROM catalog.orders o
    JOIN catalog.customers c ON c.id = o.customer_id
    WHERE o.deleted_at IS NULL";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    customer_id: i32,
    customer_name: Option<String>,
    number: String,
    status: OrderStatus,
    shipping_price: Decimal,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            customer_id: CustomerId::new(row.customer_id),
            customer_name: row.customer_name,
            number: row.number,
            status: row.status,
            shipping_price: Price::from_decimal(row.shipping_price),
            notes: row.notes,
            items: Vec::new(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    product_name: Option<String>,
    quantity: i32,
    unit_price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price: Price::from_decimal(row.unit_price),
        }
    }
}

async fn sync_items(
    conn: &mut PgConnection,
    order_id: i32,
    items: &[OrderItemInput],
) -> Result<(), RepositoryError> {
    let kept: Vec<i32> = items
        .iter()
        .filter_map(|item| item.id.map(|id| id.as_i32()))
        .collect();
    sqlx::query("DELETE FROM catalog.order_items WHERE order_id = $1 AND NOT (id = ANY($2))")
        .bind(order_id)
        .bind(kept.as_slice())
        .execute(&mut *conn)
        .await?;

    for item in items {
        match item.id {
            Some(id) => {
                sqlx::query(
                    r"
                    UPDATE catalog.order_items
                    SET product_id = $3, quantity = $4, unit_price = $5, updated_at = NOW()
                    WHERE id = $1 AND order_id = $2
                    ",
                )
                .bind(id)
                .bind(order_id)
                .bind(item.product_id)
                .bind(item.quantity)
                .bind(item.unit_price.amount())
                .execute(&mut *conn)
                .await?;
            }
            None => {
                sqlx::query(
                    r"
                    INSERT INTO catalog.order_items (order_id, product_id, quantity, unit_price)
                    VALUES ($1, $2, $3, $4)
                    ",
                )
                .bind(order_id)
                .bind(item.product_id)
                .bind(item.quantity)
                .bind(item.unit_price.amount())
                .execute(&mut *conn)
                .await?;
            }
        }
    }

    Ok(())
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a live order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, OrderRow>(&format!("{SELECT} AND o.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
        else {
            return Ok(None);
        };

        let mut order = Order::from(row);
        order.items = self
            .items_of(&[id.as_i32()])
            .await?
            .into_iter()
            .map(OrderItem::from)
            .collect();

        Ok(Some(order))
    }

    async fn items_of(&self, order_ids: &[i32]) -> Result<Vec<OrderItemRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT i.id, i.order_id, i.product_id, p.name AS product_name, i.quantity, i.unit_price
            FROM catalog.order_items i
            LEFT JOIN catalog.products p ON p.id = i.product_id
            WHERE i.order_id = ANY($1)
            ORDER BY i.order_id, i.id
            ",
        )
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// List orders for the index table.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        table: &DataTableConfig,
        query: &ListQuery,
    ) -> Result<Page<Order>, RepositoryError> {
        let mut count = QueryBuilder::new(
            r"
            SELECT COUNT(*)
            FROM catalog.orders o
            JOIN catalog.customers c ON c.id = o.customer_id
            WHERE o.deleted_at IS NULL",
        );
        push_conditions(&mut count, table, query);
        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        let mut select = QueryBuilder::new(SELECT);
        push_conditions(&mut select, table, query);
        push_order_and_page(&mut select, table, query, "o.id");
        let rows = select.build_query_as::<OrderRow>().fetch_all(self.pool).await?;

        Ok(Page {
            items: rows.into_iter().map(Order::from).collect(),
            total,
            page: query.page,
            per_page: query.per_page,
        })
    }

    /// Live orders with the given ids and their lines, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[i32]) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{SELECT} AND o.id = ANY($1) ORDER BY o.created_at DESC, o.id DESC"
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        let mut orders: Vec<Order> = rows.into_iter().map(Order::from).collect();
        let order_ids: Vec<i32> = orders.iter().map(|o| o.id.as_i32()).collect();
        for item in self.items_of(&order_ids).await? {
            if let Some(order) = orders.iter_mut().find(|o| o.id.as_i32() == item.order_id) {
                order.items.push(OrderItem::from(item));
            }
        }
        Ok(orders)
    }

    /// Insert an order and its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order number is taken.
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &OrderInput) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO catalog.orders (customer_id, number, status, shipping_price, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(input.customer_id)
        .bind(&input.number)
        .bind(input.status)
        .bind(input.shipping_price.amount())
        .bind(input.notes.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        sync_items(&mut *tx, id, &input.items).await?;
        tx.commit().await?;

        self.get(OrderId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Update a live order and reconcile its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Conflict` if the order number is taken.
    pub async fn update(&self, id: OrderId, input: &OrderInput) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE catalog.orders
            SET customer_id = $2, number = $3, status = $4, shipping_price = $5, notes = $6,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .bind(input.customer_id)
        .bind(&input.number)
        .bind(input.status)
        .bind(input.shipping_price.amount())
        .bind(input.notes.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sync_items(&mut *tx, id.as_i32(), &input.items).await?;
        tx.commit().await?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete orders. Returns the number of orders trashed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn soft_delete(&self, ids: &[i32]) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE catalog.orders
            SET deleted_at = NOW()
            WHERE id = ANY($1) AND deleted_at IS NULL
            ",
        )
        .bind(ids)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
