//! Orders resource.

use catalog_core::OrderStatus;
use rand::Rng;

use crate::components::data_table::{
    BulkAction, ColumnKind, DataTableConfig, FilterOption, RowAction, TableColumn, TableFilter,
};
use crate::resource::field::{FieldDefault, Live, SelectOption};
use crate::resource::panel::BadgeSource;
use crate::resource::{
    Derivation, FieldDescriptor, FieldGroup, FieldKind, FormSchema, LayoutKind, NavigationItem,
    RelationSource, Repeater, ResourceDescriptor, ResourceKind, Rule, SchemaError,
};

use super::SHOP_GROUP;

/// Fresh order number: `OR-` and six random digits.
#[must_use]
pub fn order_number() -> String {
    format!("OR-{}", rand::rng().random_range(100_000..=999_999))
}

/// Order descriptor.
///
/// # Errors
///
/// Returns `SchemaError` if the form declaration is inconsistent.
pub fn resource() -> Result<ResourceDescriptor, SchemaError> {
    Ok(ResourceDescriptor {
        kind: ResourceKind::Orders,
        model_label: "Order",
        title_field: "number",
        navigation: NavigationItem {
            label: "Orders",
            icon: "shopping-bag",
            group: Some(SHOP_GROUP),
            sort: Some(4),
            badge: Some(BadgeSource::ProcessingOrders),
        },
        form: form()?,
        table: table(),
        relations: Vec::new(),
    })
}

fn status_options() -> Vec<SelectOption> {
    OrderStatus::ALL
        .iter()
        .map(|s| SelectOption::new(s.as_str(), s.label()))
        .collect()
}

fn items() -> Result<Repeater, SchemaError> {
    Repeater::new(
        "items",
        "Items",
        vec![
            FieldDescriptor::relation("product_id", "Product", RelationSource::Products)
                .required()
                .live(Live::OnChange),
            FieldDescriptor::new("quantity", "Quantity", FieldKind::Integer)
                .required()
                .rule(Rule::Integer)
                .rule(Rule::MinValue(1))
                .default(FieldDefault::Text("1"))
                .live(Live::OnChange),
            FieldDescriptor::new("unit_price", "Unit Price", FieldKind::Decimal)
                .disabled_dehydrated()
                .required()
                .rule(Rule::PricePattern),
            FieldDescriptor::computed("total_price", "Total Price"),
        ],
    )
    .with_derivations(vec![
        Derivation::product_price("product_id", "unit_price"),
        Derivation::multiply("quantity", "unit_price", "total_price"),
    ])
}

fn form() -> Result<FormSchema, SchemaError> {
    FormSchema::new(
        LayoutKind::Wizard,
        vec![
            FieldGroup::new(
                "Order Details",
                vec![
                    FieldDescriptor::text("number", "Number")
                        .disabled_dehydrated()
                        .required()
                        .rule(Rule::OrderNumber)
                        .unique("orders", "number")
                        .default(FieldDefault::Generated(order_number)),
                    FieldDescriptor::relation("customer_id", "Customer", RelationSource::Customers)
                        .required(),
                    FieldDescriptor::new("shipping_price", "Shipping Costs", FieldKind::Decimal)
                        .required()
                        .rule(Rule::PricePattern),
                    FieldDescriptor::select("status", "Status", status_options())
                        .required()
                        .default(FieldDefault::Text("pending")),
                    FieldDescriptor::markdown("notes", "Notes"),
                ],
            )
            .columns(2),
            FieldGroup::repeater("Order Items", items()?),
        ],
        Vec::new(),
    )
}

fn table() -> DataTableConfig {
    DataTableConfig::new("orders")
        .column(TableColumn::new("number", "Number", "o.number").searchable().sortable())
        .column(
            TableColumn::new("customer_name", "Customer", "c.name")
                .searchable()
                .sortable()
                .toggleable(),
        )
        .column(
            TableColumn::new("status", "Status", "o.status")
                .kind(ColumnKind::Badge)
                .searchable()
                .sortable(),
        )
        .column(
            TableColumn::new("created_at", "Order Date", "o.created_at")
                .kind(ColumnKind::Date)
                .sortable(),
        )
        .filter(TableFilter::select(
            "status",
            "Status",
            "o.status",
            OrderStatus::ALL
                .iter()
                .map(|s| FilterOption::new(s.as_str(), s.label()))
                .collect(),
        ))
        .row_actions(&[RowAction::View, RowAction::Edit, RowAction::Delete])
        .bulk_action(BulkAction::export_csv())
        .bulk_action(BulkAction::delete())
        .default_sort("created_at", true)
        .search_placeholder("Search orders by number or customer...")
        .empty_state("shopping-bag", "No orders yet", None)
}
