//! View models handed to templates.
//!
//! Descriptors, form state and table records are flattened here into
//! plain strings and flags so templates stay free of engine logic.

use std::collections::HashMap;

use crate::components::data_table::{ColumnKind, DataTableConfig, RowAction};
use crate::db::Page;
use crate::models::{CellValue, TableRecord};
use crate::resource::field::{Live, SelectOption};
use crate::resource::form::ROW_ID;
use crate::resource::rules::row_path;
use crate::resource::{
    FieldDescriptor, FieldErrors, FieldKind, FieldValue, FormItem, FormSchema, FormState,
    LayoutKind, NavGroup, RelationSource, Repeater,
};

use super::params::ListParams;

/// Relation picker choices, keyed by source.
pub type RelationOptions = HashMap<RelationSource, Vec<(i32, String)>>;

/// URL of an uploaded file.
#[must_use]
pub fn storage_url(path: &str) -> String {
    format!("/storage/{}", path.trim_start_matches('/'))
}

// =============================================================================
// Navigation
// =============================================================================

#[derive(Debug, Clone)]
pub struct NavEntryView {
    pub label: &'static str,
    pub icon: &'static str,
    pub url: String,
    pub active: bool,
    pub badge: Option<(i64, &'static str)>,
}

#[derive(Debug, Clone)]
pub struct NavGroupView {
    pub label: Option<&'static str>,
    pub entries: Vec<NavEntryView>,
}

/// Sidebar navigation. `badge` resolves a badge source to its count.
#[must_use]
pub fn navigation(
    groups: &[NavGroup<'_>],
    current: &str,
    badge: impl Fn(crate::resource::panel::BadgeSource) -> Option<crate::resource::Badge>,
) -> Vec<NavGroupView> {
    groups
        .iter()
        .map(|group| NavGroupView {
            label: group.label,
            entries: group
                .entries
                .iter()
                .map(|entry| NavEntryView {
                    label: entry.item.label,
                    icon: entry.item.icon,
                    url: format!("/{}", entry.slug),
                    active: current.trim_start_matches('/').split('/').next() == Some(entry.slug),
                    badge: entry
                        .item
                        .badge
                        .and_then(&badge)
                        .map(|b| (b.count, b.color.as_str())),
                })
                .collect(),
        })
        .collect()
}

// =============================================================================
// Forms
// =============================================================================

#[derive(Debug, Clone)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// One rendered input.
#[derive(Debug, Clone)]
pub struct FieldView {
    /// Submitted name, e.g. `items[0][quantity]`.
    pub name: String,
    pub id: String,
    /// Change-event path, e.g. `items.0.quantity`.
    pub path: String,
    pub label: String,
    /// Control template: text, url, textarea, toggle, color, decimal,
    /// number, date, select, multiselect, image or computed.
    pub control: &'static str,
    pub value: String,
    pub checked: bool,
    pub options: Vec<OptionView>,
    pub readonly: bool,
    pub required: bool,
    pub error: Option<String>,
    pub helper: Option<String>,
    /// `Some(0)` reports every change, `Some(ms)` debounces.
    pub live: Option<u32>,
    pub full_width: bool,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RowView {
    pub index: usize,
    pub id: Option<String>,
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Clone)]
pub struct RepeaterView {
    pub name: &'static str,
    pub label: String,
    pub columns: u8,
    pub rows: Vec<RowView>,
    pub error: Option<String>,
    pub readonly: bool,
}

#[derive(Debug, Clone)]
pub struct GroupView {
    /// 1-based step number for wizard and tab layouts, 0 otherwise.
    pub step: usize,
    pub title: String,
    pub columns: u8,
    pub collapsible: bool,
    pub fields: Vec<FieldView>,
    pub repeaters: Vec<RepeaterView>,
}

/// A whole form, split into the main and side columns.
#[derive(Debug, Clone)]
pub struct FormView {
    /// `sections`, `tabs` or `wizard`.
    pub layout: &'static str,
    pub main: Vec<GroupView>,
    pub aside: Vec<GroupView>,
}

/// Inputs for building a [`FormView`].
pub struct FormInputs<'a> {
    pub schema: &'a FormSchema,
    pub state: &'a FormState,
    pub errors: &'a FieldErrors,
    pub options: &'a RelationOptions,
    /// Render every field read-only (record view page).
    pub readonly: bool,
}

impl FormView {
    #[must_use]
    pub fn build(inputs: &FormInputs<'_>) -> Self {
        let layout = match inputs.schema.layout {
            LayoutKind::Sections => "sections",
            LayoutKind::Tabs => "tabs",
            LayoutKind::Wizard => "wizard",
        };
        let mut main = Vec::new();
        let mut aside = Vec::new();
        for group in &inputs.schema.groups {
            let mut view = GroupView {
                step: 0,
                title: group.title.clone(),
                columns: group.columns.max(1),
                collapsible: group.collapsible,
                fields: Vec::new(),
                repeaters: Vec::new(),
            };
            for item in &group.items {
                match item {
                    FormItem::Field(field) => view.fields.push(field_view(
                        field,
                        inputs.state.get(field.name),
                        &FieldSlot::top(field.name),
                        inputs,
                    )),
                    FormItem::Repeater(repeater) => {
                        view.repeaters.push(repeater_view(repeater, inputs));
                    }
                }
            }
            if group.aside && inputs.schema.layout == LayoutKind::Sections {
                aside.push(view);
            } else {
                if inputs.schema.layout != LayoutKind::Sections {
                    view.step = main.len() + 1;
                }
                main.push(view);
            }
        }
        Self { layout, main, aside }
    }

    /// Every field view, including repeater cells.
    pub fn all_fields(&self) -> impl Iterator<Item = &FieldView> {
        self.main.iter().chain(&self.aside).flat_map(|group| {
            group.fields.iter().chain(
                group
                    .repeaters
                    .iter()
                    .flat_map(|r| r.rows.iter().flat_map(|row| &row.fields)),
            )
        })
    }
}

/// Name, id and error path of one input.
struct FieldSlot {
    name: String,
    id: String,
    path: String,
}

impl FieldSlot {
    fn top(name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: format!("field-{name}"),
            path: name.to_string(),
        }
    }

    fn row(repeater: &str, index: usize, field: &str) -> Self {
        Self {
            name: format!("{repeater}[{index}][{field}]"),
            id: format!("field-{repeater}-{index}-{field}"),
            path: row_path(repeater, index, field),
        }
    }
}

fn repeater_view(repeater: &Repeater, inputs: &FormInputs<'_>) -> RepeaterView {
    let rows = inputs
        .state
        .rows(repeater.name)
        .iter()
        .enumerate()
        .map(|(index, row)| RowView {
            index,
            id: row.text(ROW_ID).map(ToString::to_string),
            fields: repeater
                .fields
                .iter()
                .map(|field| {
                    field_view(
                        field,
                        row.get(field.name),
                        &FieldSlot::row(repeater.name, index, field.name),
                        inputs,
                    )
                })
                .collect(),
        })
        .collect();
    RepeaterView {
        name: repeater.name,
        label: repeater.label.clone(),
        columns: repeater.columns,
        rows,
        error: inputs.errors.first(repeater.name).map(ToString::to_string),
        readonly: inputs.readonly,
    }
}

fn field_view(
    field: &FieldDescriptor,
    value: Option<&FieldValue>,
    slot: &FieldSlot,
    inputs: &FormInputs<'_>,
) -> FieldView {
    let value = value.unwrap_or(&FieldValue::Null);
    let text = value.as_text().unwrap_or_default().to_string();
    let selected: Vec<&str> = match value {
        FieldValue::List(items) => items.iter().map(String::as_str).collect(),
        FieldValue::Text(t) => vec![t.as_str()],
        _ => Vec::new(),
    };

    let (control, options) = match &field.kind {
        FieldKind::Text => ("text", Vec::new()),
        FieldKind::Url => ("url", Vec::new()),
        FieldKind::Markdown => ("textarea", Vec::new()),
        FieldKind::Toggle => ("toggle", Vec::new()),
        FieldKind::Color => ("color", Vec::new()),
        FieldKind::Decimal => ("decimal", Vec::new()),
        FieldKind::Integer => ("number", Vec::new()),
        FieldKind::Date => ("date", Vec::new()),
        FieldKind::Select(choices) => ("select", select_options(choices, &selected)),
        FieldKind::Relation(source) => ("select", relation_options(inputs.options, *source, &selected)),
        FieldKind::MultiRelation(source) => (
            "multiselect",
            relation_options(inputs.options, *source, &selected),
        ),
        FieldKind::Image { .. } => ("image", Vec::new()),
        FieldKind::Computed => ("computed", Vec::new()),
    };

    FieldView {
        name: slot.name.clone(),
        id: slot.id.clone(),
        path: slot.path.clone(),
        label: field.label.clone(),
        control,
        image_url: matches!(field.kind, FieldKind::Image { .. })
            .then(|| value.as_text().map(storage_url))
            .flatten(),
        value: text,
        checked: matches!(value, FieldValue::Bool(true)),
        options,
        readonly: inputs.readonly || field.disabled,
        required: field.rules.iter().any(|r| {
            matches!(
                r,
                crate::resource::Rule::Required | crate::resource::Rule::RequiredOnCreate
            )
        }),
        error: inputs.errors.first(&slot.path).map(ToString::to_string),
        helper: field.helper_text.clone(),
        live: match field.live {
            Live::Off => None,
            Live::OnChange => Some(0),
            Live::Debounce(ms) => Some(ms),
        },
        full_width: field.full_width,
    }
}

fn select_options(choices: &[SelectOption], selected: &[&str]) -> Vec<OptionView> {
    choices
        .iter()
        .map(|choice| OptionView {
            value: choice.value.clone(),
            label: choice.label.clone(),
            selected: selected.contains(&choice.value.as_str()),
        })
        .collect()
}

fn relation_options(
    options: &RelationOptions,
    source: RelationSource,
    selected: &[&str],
) -> Vec<OptionView> {
    options
        .get(&source)
        .map(|choices| {
            choices
                .iter()
                .map(|(id, label)| {
                    let value = id.to_string();
                    OptionView {
                        selected: selected.contains(&value.as_str()),
                        value,
                        label: label.clone(),
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Relation sources a form needs choices for.
#[must_use]
pub fn relation_sources(schema: &FormSchema) -> Vec<RelationSource> {
    let mut sources = Vec::new();
    let fields = schema
        .fields()
        .chain(schema.repeaters().flat_map(|r| r.fields.iter()));
    for field in fields {
        if let FieldKind::Relation(source) | FieldKind::MultiRelation(source) = field.kind
            && !sources.contains(&source)
        {
            sources.push(source);
        }
    }
    sources
}

// =============================================================================
// Tables
// =============================================================================

#[derive(Debug, Clone)]
pub struct ColumnView {
    pub key: String,
    pub label: String,
    pub sort_url: Option<String>,
    /// Whether the listing is sorted by this column.
    pub sorted: bool,
    pub descending: bool,
}

#[derive(Debug, Clone)]
pub struct CellView {
    /// text, boolean, color, image, date, money or badge.
    pub kind: &'static str,
    pub text: String,
    pub flag: bool,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TableRowView {
    pub id: i32,
    pub cells: Vec<CellView>,
    pub view_url: Option<String>,
    pub edit_url: Option<String>,
    pub delete_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FilterView {
    pub param: String,
    pub label: String,
    pub options: Vec<OptionView>,
}

#[derive(Debug, Clone)]
pub struct ToggleView {
    pub key: String,
    pub label: String,
    pub hidden: bool,
}

#[derive(Debug, Clone)]
pub struct BulkView {
    pub key: String,
    pub label: String,
    pub destructive: bool,
}

/// A rendered index or relation table.
#[derive(Debug, Clone)]
pub struct TableView {
    pub table_id: String,
    pub action_url: String,
    pub search_param: String,
    pub hidden_param: String,
    pub search: String,
    pub search_placeholder: String,
    pub columns: Vec<ColumnView>,
    pub rows: Vec<TableRowView>,
    pub filters: Vec<FilterView>,
    pub toggles: Vec<ToggleView>,
    pub bulk_actions: Vec<BulkView>,
    pub bulk_url: Option<String>,
    pub total: i64,
    pub page: u32,
    pub last_page: u32,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
    pub empty_icon: String,
    pub empty_title: String,
    pub empty_description: Option<String>,
}

/// URLs a table links its rows to.
pub struct TableLinks<'a> {
    /// Page the table is shown on (sort, filter and page links).
    pub page_url: &'a str,
    /// Base of record links: `{base}/{id}`, `{base}/{id}/edit`.
    pub record_base: &'a str,
    pub bulk_url: Option<String>,
}

impl TableView {
    #[must_use]
    pub fn build(
        table: &DataTableConfig,
        page: &Page<TableRecord>,
        params: &ListParams,
        links: &TableLinks<'_>,
    ) -> Self {
        let visible = table.visible_columns(&params.hidden);
        let active_sort = params.sort.as_deref().or(table.default_sort.as_deref());
        let active_desc = if params.sort.is_some() {
            params.descending
        } else {
            table.default_sort_desc
        };

        let columns = visible
            .iter()
            .map(|column| ColumnView {
                key: column.key.clone(),
                label: column.label.clone(),
                sort_url: column
                    .sortable
                    .then(|| params.sorted_by(&column.key).url(links.page_url)),
                sorted: active_sort == Some(column.key.as_str()),
                descending: active_desc,
            })
            .collect();

        let rows = page
            .items
            .iter()
            .map(|record| TableRowView {
                id: record.id,
                cells: visible
                    .iter()
                    .map(|column| cell_view(column.kind, record.get(&column.key)))
                    .collect(),
                view_url: table
                    .row_actions
                    .contains(&RowAction::View)
                    .then(|| format!("{}/{}", links.record_base, record.id)),
                edit_url: table
                    .row_actions
                    .contains(&RowAction::Edit)
                    .then(|| format!("{}/{}/edit", links.record_base, record.id)),
                delete_url: table
                    .row_actions
                    .contains(&RowAction::Delete)
                    .then(|| format!("{}/{}/delete", links.record_base, record.id)),
            })
            .collect();

        let filters = table
            .filters
            .iter()
            .map(|filter| FilterView {
                param: params.filter_key(&filter.key),
                label: filter.label.clone(),
                options: filter
                    .options
                    .iter()
                    .map(|o| OptionView {
                        value: o.value.clone(),
                        label: o.label.clone(),
                        selected: params.filter(&filter.key) == Some(o.value.as_str()),
                    })
                    .collect(),
            })
            .collect();

        let toggles = table
            .columns
            .iter()
            .filter(|c| c.toggleable)
            .map(|c| ToggleView {
                key: c.key.clone(),
                label: c.label.clone(),
                hidden: params.hidden.contains(&c.key),
            })
            .collect();

        let last_page = page.last_page();
        Self {
            table_id: table.table_id.clone(),
            action_url: links.page_url.to_string(),
            search_param: params.key("search"),
            hidden_param: params.key("hidden"),
            search: params.search.clone().unwrap_or_default(),
            search_placeholder: table.search_placeholder.clone(),
            columns,
            rows,
            filters,
            toggles,
            bulk_actions: table
                .bulk_actions
                .iter()
                .map(|a| BulkView {
                    key: a.key.clone(),
                    label: a.label.clone(),
                    destructive: a.destructive,
                })
                .collect(),
            bulk_url: links.bulk_url.clone().filter(|_| table.has_bulk_actions()),
            total: page.total,
            page: page.page,
            last_page,
            prev_url: (page.page > 1).then(|| params.with_page(page.page - 1).url(links.page_url)),
            next_url: (page.page < last_page)
                .then(|| params.with_page(page.page + 1).url(links.page_url)),
            empty_icon: table.empty_icon.clone(),
            empty_title: table.empty_title.clone(),
            empty_description: table.empty_description.clone(),
        }
    }
}

fn cell_view(kind: ColumnKind, value: &CellValue) -> CellView {
    let kind_name = match kind {
        ColumnKind::Text => "text",
        ColumnKind::Boolean => "boolean",
        ColumnKind::Color => "color",
        ColumnKind::Image => "image",
        ColumnKind::Date => "date",
        ColumnKind::Money => "money",
        ColumnKind::Badge => "badge",
    };
    CellView {
        kind: kind_name,
        text: value.display(),
        flag: matches!(value, CellValue::Bool(true)),
        image_url: match (kind, value) {
            (ColumnKind::Image, CellValue::Text(path)) => Some(storage_url(path)),
            _ => None,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resource::SlugPolicy;
    use crate::resources;

    #[test]
    fn test_storage_url() {
        assert_eq!(
            storage_url("form-attachment/shoe.png"),
            "/storage/form-attachment/shoe.png"
        );
    }

    #[test]
    fn test_order_form_view_names_repeater_inputs() {
        let panel = resources::panel(SlugPolicy::Always).unwrap();
        let orders = panel.get(crate::resource::ResourceKind::Orders).unwrap();
        let row = FormState::new()
            .with(ROW_ID, FieldValue::text("11"))
            .with("product_id", FieldValue::text("4"))
            .with("quantity", FieldValue::text("2"));
        let state = FormState::new().with("items", FieldValue::Rows(vec![row]));
        let mut errors = FieldErrors::new();
        errors.add("items.0.quantity", "The quantity field must be at least 1.");
        let options = RelationOptions::from([(
            RelationSource::Products,
            vec![(4, "Shoe".to_string()), (5, "Hat".to_string())],
        )]);

        let view = FormView::build(&FormInputs {
            schema: &orders.form,
            state: &state,
            errors: &errors,
            options: &options,
            readonly: false,
        });
        assert_eq!(view.layout, "wizard");
        assert!(view.aside.is_empty());

        let quantity = view
            .all_fields()
            .find(|f| f.path == "items.0.quantity")
            .unwrap();
        assert_eq!(quantity.name, "items[0][quantity]");
        assert_eq!(quantity.value, "2");
        assert!(quantity.error.is_some());

        let product = view
            .all_fields()
            .find(|f| f.path == "items.0.product_id")
            .unwrap();
        let selected: Vec<&str> = product
            .options
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.label.as_str())
            .collect();
        assert_eq!(selected, ["Shoe"]);

        let repeater = &view.main[1].repeaters[0];
        assert_eq!(repeater.rows[0].id.as_deref(), Some("11"));
    }

    #[test]
    fn test_disabled_fields_render_readonly() {
        let panel = resources::panel(SlugPolicy::Always).unwrap();
        let brands = panel.get(crate::resource::ResourceKind::Brands).unwrap();
        let view = FormView::build(&FormInputs {
            schema: &brands.form,
            state: &FormState::new(),
            errors: &FieldErrors::new(),
            options: &RelationOptions::new(),
            readonly: false,
        });
        let slug = view.all_fields().find(|f| f.name == "slug").unwrap();
        assert!(slug.readonly);
        let name = view.all_fields().find(|f| f.name == "name").unwrap();
        assert!(!name.readonly);
        assert_eq!(name.live, Some(1000));
        assert!(!view.aside.is_empty());
    }

    #[test]
    fn test_relation_sources_include_repeater_fields() {
        let panel = resources::panel(SlugPolicy::Always).unwrap();
        let orders = panel.get(crate::resource::ResourceKind::Orders).unwrap();
        let sources = relation_sources(&orders.form);
        assert!(sources.contains(&RelationSource::Customers));
        assert!(sources.contains(&RelationSource::Products));
    }

    #[test]
    fn test_table_view_links_and_pagination() {
        let table = DataTableConfig::new("brands")
            .column(
                crate::components::data_table::TableColumn::new("name", "Name", "b.name")
                    .sortable(),
            )
            .row_actions(&[RowAction::Edit, RowAction::Delete]);
        let page = Page {
            items: vec![TableRecord::new(7).cell("name", CellValue::Text("Acme".to_string()))],
            total: 51,
            page: 2,
            per_page: 25,
        };
        let params = ListParams::parse(&[("page".to_string(), "2".to_string())], "");
        let view = TableView::build(
            &table,
            &page,
            &params,
            &TableLinks {
                page_url: "/brands",
                record_base: "/brands",
                bulk_url: None,
            },
        );
        assert_eq!(view.last_page, 3);
        assert_eq!(view.prev_url.as_deref(), Some("/brands"));
        assert_eq!(view.next_url.as_deref(), Some("/brands?page=3"));
        assert_eq!(view.rows[0].edit_url.as_deref(), Some("/brands/7/edit"));
        assert_eq!(view.rows[0].view_url, None);
        assert_eq!(view.rows[0].cells[0].text, "Acme");
        assert_eq!(
            view.columns[0].sort_url.as_deref(),
            Some("/brands?sort=name&direction=asc")
        );
        assert!(!view.columns[0].sorted);
    }

    #[test]
    fn test_only_wizard_groups_are_numbered() {
        let panel = resources::panel(SlugPolicy::Always).unwrap();
        let build = |kind| {
            FormView::build(&FormInputs {
                schema: &panel.get(kind).unwrap().form,
                state: &FormState::new(),
                errors: &FieldErrors::new(),
                options: &RelationOptions::new(),
                readonly: false,
            })
        };

        let orders = build(crate::resource::ResourceKind::Orders);
        let steps: Vec<usize> = orders.main.iter().map(|g| g.step).collect();
        assert_eq!(steps, [1, 2]);

        let brands = build(crate::resource::ResourceKind::Brands);
        assert!(brands.main.iter().chain(&brands.aside).all(|g| g.step == 0));
    }
}
