//! Data table component types.
//!
//! These types define the list table of a resource: its columns, filters,
//! row and bulk actions. Column and filter `expr` values are SQL
//! expressions over the resource's list query and double as the whitelist
//! for search, sort and filter parameters.

use serde::{Deserialize, Serialize};

/// How a column renders its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    /// Check/cross icon.
    Boolean,
    /// Color swatch.
    Color,
    /// Thumbnail of an uploaded image.
    Image,
    /// Calendar date.
    Date,
    /// Two-decimal amount.
    Money,
    /// Status pill.
    Badge,
}

/// Column definition for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumn {
    /// Key of the cell in a table row.
    pub key: String,
    /// Display label for the column header.
    pub label: String,
    pub kind: ColumnKind,
    /// SQL expression the column is searched and sorted by.
    pub expr: String,
    pub sortable: bool,
    pub searchable: bool,
    /// Whether the operator can hide the column.
    pub toggleable: bool,
    /// Whether the column is visible by default.
    pub default_visible: bool,
}

impl TableColumn {
    /// Create a plain text column.
    #[must_use]
    pub fn new(key: &str, label: &str, expr: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: ColumnKind::Text,
            expr: expr.to_string(),
            sortable: false,
            searchable: false,
            toggleable: false,
            default_visible: true,
        }
    }

    #[must_use]
    pub const fn kind(mut self, kind: ColumnKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub const fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    #[must_use]
    pub const fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    #[must_use]
    pub const fn toggleable(mut self) -> Self {
        self.toggleable = true;
        self
    }

    /// Set whether the column is visible by default.
    #[must_use]
    pub const fn visible(mut self, visible: bool) -> Self {
        self.default_visible = visible;
        self
    }
}

/// Option for select filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterOption {
    /// Option value.
    pub value: String,
    /// Display label.
    pub label: String,
}

impl FilterOption {
    /// Create a new filter option.
    #[must_use]
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

/// Equality filter on one expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableFilter {
    /// Filter parameter key.
    pub key: String,
    /// Display label.
    pub label: String,
    /// SQL expression compared (as text) with the selected option.
    pub expr: String,
    pub options: Vec<FilterOption>,
}

impl TableFilter {
    /// Create a select filter.
    #[must_use]
    pub fn select(key: &str, label: &str, expr: &str, options: Vec<FilterOption>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            expr: expr.to_string(),
            options,
        }
    }

    /// Yes/no filter over a boolean expression.
    #[must_use]
    pub fn boolean(key: &str, label: &str, expr: &str) -> Self {
        Self::select(
            key,
            label,
            expr,
            vec![
                FilterOption::new("true", "Yes"),
                FilterOption::new("false", "No"),
            ],
        )
    }

    /// Whether `value` is one of the offered options.
    #[must_use]
    pub fn accepts(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }
}

/// Per-row action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAction {
    View,
    Edit,
    Delete,
}

/// What a bulk action does with the selected records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkKind {
    Delete,
    ExportCsv,
}

/// Bulk action definition for data tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkAction {
    /// Action key (posted by the bulk form).
    pub key: String,
    /// Display label.
    pub label: String,
    /// Icon name.
    pub icon: String,
    pub kind: BulkKind,
    /// Whether this is a destructive action.
    pub destructive: bool,
}

impl BulkAction {
    /// Soft-delete the selected records.
    #[must_use]
    pub fn delete() -> Self {
        Self {
            key: "delete".to_string(),
            label: "Delete selected".to_string(),
            icon: "trash".to_string(),
            kind: BulkKind::Delete,
            destructive: true,
        }
    }

    /// Download the selected records as CSV.
    #[must_use]
    pub fn export_csv() -> Self {
        Self {
            key: "export".to_string(),
            label: "Export selected".to_string(),
            icon: "arrow-down-tray".to_string(),
            kind: BulkKind::ExportCsv,
            destructive: false,
        }
    }
}

/// Configuration for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTableConfig {
    /// Unique table identifier.
    pub table_id: String,
    /// Column definitions.
    pub columns: Vec<TableColumn>,
    /// Filter definitions.
    pub filters: Vec<TableFilter>,
    pub row_actions: Vec<RowAction>,
    /// Bulk action definitions.
    pub bulk_actions: Vec<BulkAction>,
    /// Column key used when no sort is requested.
    pub default_sort: Option<String>,
    pub default_sort_desc: bool,
    /// Search placeholder text.
    pub search_placeholder: String,
    /// Icon for empty state.
    pub empty_icon: String,
    /// Title for empty state.
    pub empty_title: String,
    /// Description for empty state.
    pub empty_description: Option<String>,
}

impl DataTableConfig {
    /// Create a new data table configuration.
    #[must_use]
    pub fn new(table_id: &str) -> Self {
        Self {
            table_id: table_id.to_string(),
            columns: vec![],
            filters: vec![],
            row_actions: vec![RowAction::Edit],
            bulk_actions: vec![],
            default_sort: None,
            default_sort_desc: false,
            search_placeholder: "Search...".to_string(),
            empty_icon: "x-mark".to_string(),
            empty_title: "No records found".to_string(),
            empty_description: None,
        }
    }

    /// Add a column.
    #[must_use]
    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a filter.
    #[must_use]
    pub fn filter(mut self, filter: TableFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Replace the row actions.
    #[must_use]
    pub fn row_actions(mut self, actions: &[RowAction]) -> Self {
        self.row_actions = actions.to_vec();
        self
    }

    /// Add a bulk action.
    #[must_use]
    pub fn bulk_action(mut self, action: BulkAction) -> Self {
        self.bulk_actions.push(action);
        self
    }

    #[must_use]
    pub fn default_sort(mut self, key: &str, descending: bool) -> Self {
        self.default_sort = Some(key.to_string());
        self.default_sort_desc = descending;
        self
    }

    /// Set search placeholder.
    #[must_use]
    pub fn search_placeholder(mut self, placeholder: &str) -> Self {
        self.search_placeholder = placeholder.to_string();
        self
    }

    /// Set empty state configuration.
    #[must_use]
    pub fn empty_state(mut self, icon: &str, title: &str, description: Option<&str>) -> Self {
        self.empty_icon = icon.to_string();
        self.empty_title = title.to_string();
        self.empty_description = description.map(ToString::to_string);
        self
    }

    /// Get default visible columns.
    #[must_use]
    pub fn default_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.default_visible)
            .map(|c| c.key.clone())
            .collect()
    }

    /// Columns to render given the operator's hidden set.
    ///
    /// Only toggleable columns can be hidden.
    #[must_use]
    pub fn visible_columns(&self, hidden: &[String]) -> Vec<&TableColumn> {
        self.columns
            .iter()
            .filter(|c| !(c.toggleable && hidden.contains(&c.key)))
            .collect()
    }

    /// Expressions searched by the free-text box.
    #[must_use]
    pub fn search_exprs(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.searchable)
            .map(|c| c.expr.as_str())
            .collect()
    }

    /// SQL expression for a sort key, if the column is sortable.
    #[must_use]
    pub fn sort_expr(&self, key: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.sortable && c.key == key)
            .map(|c| c.expr.as_str())
    }

    #[must_use]
    pub fn find_filter(&self, key: &str) -> Option<&TableFilter> {
        self.filters.iter().find(|f| f.key == key)
    }

    #[must_use]
    pub fn find_bulk_action(&self, key: &str) -> Option<&BulkAction> {
        self.bulk_actions.iter().find(|a| a.key == key)
    }

    #[must_use]
    pub fn has_bulk_actions(&self) -> bool {
        !self.bulk_actions.is_empty()
    }

    #[must_use]
    pub fn has_column_picker(&self) -> bool {
        self.columns.iter().any(|c| c.toggleable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DataTableConfig {
        DataTableConfig::new("brands")
            .column(TableColumn::new("name", "Name", "b.name").searchable().sortable())
            .column(
                TableColumn::new("is_visible", "Visibility", "b.is_visible")
                    .kind(ColumnKind::Boolean)
                    .sortable()
                    .toggleable(),
            )
            .column(TableColumn::new("notes", "Notes", "b.notes"))
    }

    #[test]
    fn test_sort_expr_is_whitelisted() {
        let table = config();
        assert_eq!(table.sort_expr("name"), Some("b.name"));
        assert_eq!(table.sort_expr("notes"), None);
        assert_eq!(table.sort_expr("b.name; drop table brands"), None);
    }

    #[test]
    fn test_only_toggleable_columns_hide() {
        let table = config();
        let hidden = vec!["is_visible".to_string(), "name".to_string()];
        let keys: Vec<&str> = table
            .visible_columns(&hidden)
            .iter()
            .map(|c| c.key.as_str())
            .collect();
        assert_eq!(keys, ["name", "notes"]);
        assert!(table.has_column_picker());
    }

    #[test]
    fn test_search_exprs() {
        assert_eq!(config().search_exprs(), ["b.name"]);
    }
}
