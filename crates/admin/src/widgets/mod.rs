//! Dashboard widgets.
//!
//! Widgets are computed from plain counts so they can be tested without a
//! database; [`load`] fetches the counts for the widgets a panel places.

pub mod products_chart;
pub mod stats_overview;

use chrono::{Datelike, Utc};
use sqlx::PgPool;

use catalog_core::OrderStatus;

use crate::db::{RepositoryError, StatsRepository};
use crate::resource::WidgetKind;
use crate::resource::panel::WidgetPlacement;

pub use products_chart::ProductsChart;
pub use stats_overview::{Stat, StatColor};

/// A widget ready to render.
#[derive(Debug, Clone)]
pub enum Widget {
    Stats(Vec<Stat>),
    Chart(ProductsChart),
}

/// Compute the placed widgets, in placement order.
///
/// # Errors
///
/// Returns `RepositoryError` if a count query fails.
pub async fn load(pool: &PgPool, placements: &[WidgetPlacement]) -> Result<Vec<Widget>, RepositoryError> {
    let stats = StatsRepository::new(pool);
    let mut widgets = Vec::with_capacity(placements.len());

    for placement in placements {
        let widget = match placement.kind {
            WidgetKind::StatsOverview => {
                let (customers, products, pending) = tokio::try_join!(
                    stats.customer_count(),
                    stats.product_count(),
                    stats.order_count(OrderStatus::Pending),
                )?;
                Widget::Stats(stats_overview::stats(customers, products, pending))
            }
            WidgetKind::ProductsChart => {
                let counts = stats.products_per_month(Utc::now().year()).await?;
                Widget::Chart(ProductsChart::from_monthly_counts(&counts))
            }
        };
        widgets.push(widget);
    }

    Ok(widgets)
}

/// SVG polyline points for `values` scaled into a `width` x `height` box.
///
/// The largest value touches the top edge; an all-zero series is a flat
/// line along the bottom.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn polyline_points(values: &[i64], width: f64, height: f64) -> String {
    let max = values.iter().copied().max().unwrap_or(0).max(1) as f64;
    let step = if values.len() > 1 {
        width / (values.len() - 1) as f64
    } else {
        0.0
    };
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let x = step * i as f64;
            let y = height - (v as f64 / max) * height;
            format!("{x:.1},{y:.1}")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polyline_points_scale() {
        assert_eq!(polyline_points(&[0, 2, 1], 100.0, 20.0), "0.0,20.0 50.0,0.0 100.0,10.0");
    }

    #[test]
    fn test_polyline_points_flat() {
        assert_eq!(polyline_points(&[0, 0], 10.0, 5.0), "0.0,5.0 10.0,5.0");
        assert_eq!(polyline_points(&[], 10.0, 5.0), "");
    }
}
