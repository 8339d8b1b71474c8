//! Order model.

use catalog_core::{CustomerId, OrderId, OrderItemId, OrderStatus, Price, ProductId, line_total};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{
    CellValue, InputError, TableRecord, optional_text, parse_optional, parse_required,
    required_text,
};
use crate::resource::form::ROW_ID;
use crate::resource::{FieldValue, FormState};

/// A customer order with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub customer_name: Option<String>,
    pub number: String,
    pub status: OrderStatus,
    pub shipping_price: Price,
    pub notes: Option<String>,
    /// Only loaded for single-record reads.
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One order line. The unit price is a snapshot of the product price.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Price,
}

impl OrderItem {
    /// Line total. A stored price is at most `999999.99`, so the product
    /// with any `i32` quantity fits.
    #[must_use]
    pub fn total(&self) -> Decimal {
        line_total(self.quantity, self.unit_price.amount()).unwrap_or_default()
    }

    fn to_state(&self) -> FormState {
        FormState::new()
            .with(ROW_ID, FieldValue::Text(self.id.to_string()))
            .with("product_id", FieldValue::Text(self.product_id.to_string()))
            .with("quantity", FieldValue::Text(self.quantity.to_string()))
            .with("unit_price", FieldValue::Text(self.unit_price.to_string()))
            .with("total_price", FieldValue::Text(format!("{:.2}", self.total())))
    }
}

impl Order {
    /// Sum of the line totals, without shipping.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(OrderItem::total).sum()
    }

    /// Values for the edit form.
    #[must_use]
    pub fn to_state(&self) -> FormState {
        FormState::new()
            .with("number", FieldValue::text(&self.number))
            .with("customer_id", FieldValue::Text(self.customer_id.to_string()))
            .with(
                "shipping_price",
                FieldValue::Text(self.shipping_price.to_string()),
            )
            .with("status", FieldValue::text(self.status.as_str()))
            .with("notes", FieldValue::opt_text(self.notes.clone()))
            .with(
                "items",
                FieldValue::Rows(self.items.iter().map(OrderItem::to_state).collect()),
            )
    }

    #[must_use]
    pub fn table_record(&self) -> TableRecord {
        TableRecord::new(self.id.as_i32())
            .cell("number", CellValue::Text(self.number.clone()))
            .cell("customer_name", CellValue::opt_text(self.customer_name.clone()))
            .cell("status", CellValue::Text(self.status.label().to_string()))
            .cell("created_at", CellValue::Date(self.created_at.date_naive()))
    }
}

/// Values written when creating or updating an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderInput {
    pub customer_id: CustomerId,
    pub number: String,
    pub status: OrderStatus,
    pub shipping_price: Price,
    pub notes: Option<String>,
    pub items: Vec<OrderItemInput>,
}

/// One submitted order line. `id` is set for lines that already exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemInput {
    pub id: Option<OrderItemId>,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Price,
}

impl OrderItemInput {
    fn from_state(row: &FormState) -> Result<Self, InputError> {
        Ok(Self {
            id: parse_optional::<i32>(row, ROW_ID)?.map(OrderItemId::new),
            product_id: ProductId::new(parse_required(row, "product_id")?),
            quantity: parse_required(row, "quantity")?,
            unit_price: parse_required(row, "unit_price")?,
        })
    }
}

impl OrderInput {
    /// Build from a dehydrated form state.
    ///
    /// # Errors
    ///
    /// Returns `InputError` if a required value is missing or malformed.
    pub fn from_state(state: &FormState) -> Result<Self, InputError> {
        let items = state
            .rows("items")
            .iter()
            .map(OrderItemInput::from_state)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            customer_id: CustomerId::new(parse_required(state, "customer_id")?),
            number: required_text(state, "number")?,
            status: parse_required(state, "status")?,
            shipping_price: parse_required(state, "shipping_price")?,
            notes: optional_text(state, "notes"),
            items,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn row(id: Option<&str>, product: &str, quantity: &str, price: &str) -> FormState {
        let row = FormState::new()
            .with("product_id", FieldValue::text(product))
            .with("quantity", FieldValue::text(quantity))
            .with("unit_price", FieldValue::text(price));
        match id {
            Some(id) => row.with(ROW_ID, FieldValue::text(id)),
            None => row,
        }
    }

    #[test]
    fn test_input_from_state() {
        let state = FormState::new()
            .with("number", FieldValue::text("OR-123456"))
            .with("customer_id", FieldValue::text("7"))
            .with("shipping_price", FieldValue::text("4.50"))
            .with("status", FieldValue::text("processing"))
            .with(
                "items",
                FieldValue::Rows(vec![
                    row(Some("11"), "1", "3", "25.00"),
                    row(None, "2", "1", "9.99"),
                ]),
            );
        let input = OrderInput::from_state(&state).unwrap();
        assert_eq!(input.status, OrderStatus::Processing);
        assert_eq!(input.items.len(), 2);
        assert_eq!(input.items[0].id, Some(OrderItemId::new(11)));
        assert_eq!(input.items[1].id, None);
    }

    #[test]
    fn test_line_totals() {
        let item = OrderItem {
            id: OrderItemId::new(1),
            product_id: ProductId::new(1),
            product_name: None,
            quantity: 3,
            unit_price: Price::parse("25.00").unwrap(),
        };
        assert_eq!(item.total(), Decimal::new(7500, 2));
        assert_eq!(item.to_state().text("total_price"), Some("75.00"));
    }
}
