//! Categories resource.

use crate::components::data_table::{
    BulkAction, ColumnKind, DataTableConfig, RowAction, TableColumn, TableFilter,
};
use crate::resource::field::{FieldDefault, Live};
use crate::resource::{
    Derivation, FieldDescriptor, FieldGroup, FormSchema, LayoutKind, NavigationItem,
    RelationDescriptor, RelationLink, RelationSource, ResourceDescriptor, ResourceKind, Rule,
    SchemaError,
};

use super::SHOP_GROUP;

/// Category descriptor.
///
/// # Errors
///
/// Returns `SchemaError` if the form declaration is inconsistent.
pub fn resource() -> Result<ResourceDescriptor, SchemaError> {
    Ok(ResourceDescriptor {
        kind: ResourceKind::Categories,
        model_label: "Category",
        title_field: "name",
        navigation: NavigationItem {
            label: "Categories",
            icon: "tag",
            group: Some(SHOP_GROUP),
            sort: Some(5),
            badge: None,
        },
        form: form()?,
        table: table(),
        relations: vec![RelationDescriptor {
            name: "products",
            title: "Products",
            related: ResourceKind::Products,
            link: RelationLink::Pivot {
                table: "category_product",
                parent_column: "category_id",
                field: "categories",
            },
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
                        .unique("categories", "name")
                        .live(Live::OnChange),
                    FieldDescriptor::text("slug", "Slug")
                        .disabled_dehydrated()
                        .required()
                        .unique("categories", "slug"),
                    FieldDescriptor::markdown("description", "Description"),
                ],
            )
            .columns(2),
            FieldGroup::new(
                "Status",
                vec![
                    FieldDescriptor::toggle("is_visible", "Visibility")
                        .helper("Enable or disable category visibility")
                        .default(FieldDefault::Bool(true)),
                    FieldDescriptor::relation("parent_id", "Parent", RelationSource::Categories)
                        .rule(Rule::NoCategoryCycle),
                ],
            )
            .aside(),
        ],
        vec![Derivation::slug("name", "slug")],
    )
}

fn table() -> DataTableConfig {
    DataTableConfig::new("categories")
        .column(TableColumn::new("name", "Name", "c.name").searchable().sortable())
        .column(
            TableColumn::new("parent_name", "Parent", "p.name")
                .searchable()
                .sortable(),
        )
        .column(
            TableColumn::new("is_visible", "Visibility", "c.is_visible")
                .kind(ColumnKind::Boolean)
                .sortable()
                .toggleable(),
        )
        .column(
            TableColumn::new("updated_at", "Updated Date", "c.updated_at")
                .kind(ColumnKind::Date)
                .sortable(),
        )
        .filter(TableFilter::boolean("is_visible", "Visibility", "c.is_visible"))
        .row_actions(&[RowAction::View, RowAction::Edit, RowAction::Delete])
        .bulk_action(BulkAction::delete())
        .search_placeholder("Search categories...")
        .empty_state("tag", "No categories yet", None)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_has_cycle_guard() {
        let resource = resource().unwrap();
        let parent = resource.form.field("parent_id").unwrap();
        assert!(parent.rules.contains(&Rule::NoCategoryCycle));
        assert!(!parent.is_required_for(crate::resource::Operation::Create));
    }
}
