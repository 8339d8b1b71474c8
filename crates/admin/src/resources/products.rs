//! Products resource.

use catalog_core::ProductType;

use crate::components::data_table::{
    BulkAction, ColumnKind, DataTableConfig, FilterOption, RowAction, TableColumn, TableFilter,
};
use crate::resource::field::{FieldDefault, Live, SelectOption};
use crate::resource::{
    Derivation, FieldDescriptor, FieldGroup, FieldKind, FormSchema, LayoutKind, NavigationItem,
    RelationSource, ResourceDescriptor, ResourceKind, Rule, SchemaError,
};

use super::SHOP_GROUP;

/// Directory uploads are stored in, relative to the storage root.
pub const IMAGE_DIRECTORY: &str = "form-attachment";

/// Product descriptor.
///
/// # Errors
///
/// Returns `SchemaError` if the form declaration is inconsistent.
pub fn resource() -> Result<ResourceDescriptor, SchemaError> {
    Ok(ResourceDescriptor {
        kind: ResourceKind::Products,
        model_label: "Product",
        title_field: "name",
        navigation: NavigationItem {
            label: "Products",
            icon: "rectangle-stack",
            group: Some(SHOP_GROUP),
            sort: None,
            badge: None,
        },
        form: form()?,
        table: table(),
        relations: Vec::new(),
    })
}

fn type_options() -> Vec<SelectOption> {
    ProductType::ALL
        .iter()
        .map(|t| SelectOption::new(t.as_str(), t.label()))
        .collect()
}

fn form() -> Result<FormSchema, SchemaError> {
    FormSchema::new(
        LayoutKind::Sections,
        vec![
            FieldGroup::new(
                "Information",
                vec![
                    FieldDescriptor::text("name", "Name")
                        .required()
                        .live(Live::OnChange),
                    FieldDescriptor::text("slug", "Slug")
                        .disabled_dehydrated()
                        .required()
                        .unique("products", "slug"),
                    FieldDescriptor::markdown("description", "Description"),
                ],
            )
            .columns(2),
            FieldGroup::new(
                "Pricing & Inventory",
                vec![
                    FieldDescriptor::text("sku", "SKU (Stock Keeping Unit)")
                        .required()
                        .unique("products", "sku"),
                    FieldDescriptor::new("price", "Price", FieldKind::Decimal)
                        .required()
                        .rule(Rule::PricePattern),
                    FieldDescriptor::new("quantity", "Quantity", FieldKind::Integer)
                        .required()
                        .rule(Rule::Integer)
                        .rule(Rule::MinValue(0)),
                    FieldDescriptor::select("type", "Type", type_options()),
                ],
            )
            .columns(2),
            FieldGroup::new(
                "Status",
                vec![
                    FieldDescriptor::toggle("is_visible", "Visibility")
                        .helper("Enable or disable product visibility")
                        .default(FieldDefault::Bool(true)),
                    FieldDescriptor::toggle("is_featured", "Featured")
                        .helper("Enable or disable featured status"),
                    FieldDescriptor::new("published_at", "Availability", FieldKind::Date)
                        .rule(Rule::Date)
                        .default(FieldDefault::Today),
                ],
            )
            .aside(),
            FieldGroup::new(
                "Image",
                vec![
                    FieldDescriptor::new(
                        "image",
                        "Image",
                        FieldKind::Image {
                            directory: IMAGE_DIRECTORY,
                        },
                    )
                    .required_on_create()
                    .full_width(),
                ],
            )
            .aside()
            .collapsible(),
            FieldGroup::new(
                "Associations",
                vec![
                    FieldDescriptor::relation("brand_id", "Brand", RelationSource::Brands)
                        .required(),
                    FieldDescriptor::multi_relation(
                        "categories",
                        "Categories",
                        RelationSource::Categories,
                    ),
                ],
            )
            .aside()
            .collapsible(),
        ],
        vec![Derivation::slug("name", "slug")],
    )
}

fn table() -> DataTableConfig {
    DataTableConfig::new("products")
        .column(TableColumn::new("image", "Image", "p.image").kind(ColumnKind::Image))
        .column(TableColumn::new("name", "Name", "p.name").searchable().sortable())
        .column(
            TableColumn::new("brand_name", "Brand", "b.name")
                .searchable()
                .sortable()
                .toggleable(),
        )
        .column(
            TableColumn::new("is_visible", "Visibility", "p.is_visible")
                .kind(ColumnKind::Boolean)
                .sortable()
                .toggleable(),
        )
        .column(
            TableColumn::new("price", "Price", "p.price")
                .kind(ColumnKind::Money)
                .sortable()
                .toggleable(),
        )
        .column(
            TableColumn::new("quantity", "Quantity", "p.quantity")
                .sortable()
                .toggleable(),
        )
        .column(
            TableColumn::new("published_at", "Published Date", "p.published_at")
                .kind(ColumnKind::Date)
                .sortable(),
        )
        .column(TableColumn::new("type", "Type", "p.type").kind(ColumnKind::Badge))
        .filter(TableFilter::select(
            "type",
            "Type",
            "p.type",
            ProductType::ALL
                .iter()
                .map(|t| FilterOption::new(t.as_str(), t.label()))
                .collect(),
        ))
        .filter(TableFilter::boolean("is_visible", "Visibility", "p.is_visible"))
        .filter(TableFilter::boolean("is_featured", "Featured", "p.is_featured"))
        .row_actions(&[RowAction::View, RowAction::Edit, RowAction::Delete])
        .bulk_action(BulkAction::delete())
        .search_placeholder("Search products...")
        .empty_state("rectangle-stack", "No products yet", None)
}
