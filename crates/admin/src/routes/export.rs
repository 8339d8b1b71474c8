//! CSV export of selected orders.

use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::db::OrderRepository;
use crate::error::AppError;
use crate::models::Order;
use crate::state::AppState;

const HEADERS: [&str; 8] = [
    "Number",
    "Customer",
    "Status",
    "Order Date",
    "Items",
    "Subtotal",
    "Shipping",
    "Total",
];

/// Download the selected orders as `orders.csv`.
///
/// # Errors
///
/// Returns `AppError` if loading fails or the CSV cannot be written.
pub async fn orders_csv(state: &AppState, ids: &[i32]) -> Result<Response, AppError> {
    let orders = OrderRepository::new(state.pool()).get_many(ids).await?;
    let body = write_csv(&orders)?;
    tracing::info!(count = orders.len(), "Exported orders");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"orders.csv\""),
        ],
        body,
    )
        .into_response())
}

fn write_csv(orders: &[Order]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let to_internal = |e: csv::Error| AppError::Internal(format!("CSV export failed: {e}"));

    writer.write_record(HEADERS).map_err(to_internal)?;
    for order in orders {
        let subtotal = order.subtotal();
        let shipping = order.shipping_price.amount();
        writer
            .write_record([
                order.number.clone(),
                order.customer_name.clone().unwrap_or_default(),
                order.status.label().to_string(),
                order.created_at.date_naive().to_string(),
                order.items.len().to_string(),
                format!("{subtotal:.2}"),
                format!("{shipping:.2}"),
                format!("{:.2}", subtotal + shipping),
            ])
            .map_err(to_internal)?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV export failed: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use catalog_core::{CustomerId, OrderId, OrderItemId, OrderStatus, Price, ProductId};
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::OrderItem;

    #[test]
    fn test_write_csv_totals_lines_and_shipping() {
        let created = Utc.with_ymd_and_hms(2026, 2, 3, 10, 0, 0).unwrap();
        let order = Order {
            id: OrderId::new(1),
            customer_id: CustomerId::new(2),
            customer_name: Some("Ada, Countess".to_string()),
            number: "OR-123456".to_string(),
            status: OrderStatus::Processing,
            shipping_price: Price::parse("5").unwrap(),
            notes: None,
            items: vec![OrderItem {
                id: OrderItemId::new(3),
                product_id: ProductId::new(4),
                product_name: Some("Shoe".to_string()),
                quantity: 2,
                unit_price: Price::parse("12.50").unwrap(),
            }],
            created_at: created,
            updated_at: created,
        };
        let csv = String::from_utf8(write_csv(&[order]).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Number,Customer,Status,Order Date,Items,Subtotal,Shipping,Total")
        );
        assert_eq!(
            lines.next(),
            Some("OR-123456,\"Ada, Countess\",Processing,2026-02-03,1,25.00,5.00,30.00")
        );
    }
}
