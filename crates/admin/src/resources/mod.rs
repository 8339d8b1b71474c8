//! The catalog resources registered on the admin panel.

pub mod brands;
pub mod categories;
pub mod orders;
pub mod products;

use crate::resource::{Panel, SchemaError, SlugPolicy, WidgetKind};

/// Navigation group every catalog resource lives in.
pub const SHOP_GROUP: &str = "Shop";

/// Build the panel with every resource and dashboard widget.
///
/// # Errors
///
/// Returns `SchemaError` if a resource declares its derivations out of
/// order or against unknown fields.
pub fn panel(slug_policy: SlugPolicy) -> Result<Panel, SchemaError> {
    Ok(Panel::new(slug_policy)
        .register(brands::resource()?)
        .register(categories::resource()?)
        .register(products::resource()?)
        .register(orders::resource()?)
        .widget(WidgetKind::StatsOverview, 1)
        .widget(WidgetKind::ProductsChart, 2))
}
