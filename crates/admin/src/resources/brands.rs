//! Brands resource.

use crate::components::data_table::{
    BulkAction, ColumnKind, DataTableConfig, RowAction, TableColumn, TableFilter,
};
use crate::resource::field::{FieldDefault, Live};
use crate::resource::{
    Derivation, FieldDescriptor, FieldGroup, FieldKind, FormSchema, LayoutKind, NavigationItem,
    RelationDescriptor, RelationLink, ResourceDescriptor, ResourceKind, Rule, SchemaError,
};

use super::SHOP_GROUP;

/// Brand descriptor.
///
/// # Errors
///
/// Returns `SchemaError` if the form declaration is inconsistent.
pub fn resource() -> Result<ResourceDescriptor, SchemaError> {
    Ok(ResourceDescriptor {
        kind: ResourceKind::Brands,
        model_label: "Brand",
        title_field: "name",
        navigation: NavigationItem {
            label: "Brands",
            icon: "rectangle-stack",
            group: Some(SHOP_GROUP),
            sort: Some(1),
            badge: None,
        },
        form: form()?,
        table: table(),
        relations: vec![RelationDescriptor {
            name: "products",
            title: "Products",
            related: ResourceKind::Products,
            link: RelationLink::ForeignKey { field: "brand_id" },
        }],
    })
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
                        .unique("brands", "name")
                        .live(Live::Debounce(1000)),
                    FieldDescriptor::text("slug", "Slug")
                        .disabled_dehydrated()
                        .required()
                        .unique("brands", "slug"),
                    FieldDescriptor::new("url", "Website URL", FieldKind::Url)
                        .required()
                        .rule(Rule::Url)
                        .unique("brands", "url")
                        .full_width(),
                    FieldDescriptor::markdown("description", "Description"),
                ],
            )
            .columns(2),
            FieldGroup::new(
                "Status",
                vec![
                    FieldDescriptor::toggle("is_visible", "Visibility")
                        .helper("Enable or disable brand visibility")
                        .default(FieldDefault::Bool(true)),
                ],
            )
            .aside(),
            FieldGroup::new(
                "Color",
                vec![
                    FieldDescriptor::new("primary_hex", "Primary Color", FieldKind::Color)
                        .rule(Rule::HexColor),
                ],
            )
            .aside(),
        ],
        vec![Derivation::slug("name", "slug")],
    )
}

fn table() -> DataTableConfig {
    DataTableConfig::new("brands")
        .column(TableColumn::new("name", "Name", "b.name").searchable().sortable())
        .column(
            TableColumn::new("url", "Website URL", "b.url")
                .searchable()
                .sortable(),
        )
        .column(
            TableColumn::new("primary_hex", "Primary Color", "b.primary_hex")
                .kind(ColumnKind::Color)
                .searchable()
                .sortable(),
        )
        .column(
            TableColumn::new("is_visible", "Visibility", "b.is_visible")
                .kind(ColumnKind::Boolean)
                .sortable()
                .toggleable(),
        )
        .column(
            TableColumn::new("updated_at", "Updated Date", "b.updated_at")
                .kind(ColumnKind::Date)
                .sortable(),
        )
        .filter(TableFilter::boolean("is_visible", "Visibility", "b.is_visible"))
        .row_actions(&[RowAction::View, RowAction::Edit, RowAction::Delete])
        .bulk_action(BulkAction::delete())
        .search_placeholder("Search brands...")
        .empty_state("rectangle-stack", "No brands yet", Some("Create a brand to get started"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_is_disabled_but_persisted() {
        let resource = resource().unwrap();
        let slug = resource.form.field("slug").unwrap();
        assert!(slug.disabled);
        assert!(slug.is_persisted());
    }

    #[test]
    fn test_name_debounces() {
        let resource = resource().unwrap();
        assert_eq!(resource.form.field("name").unwrap().live, Live::Debounce(1000));
    }
}
