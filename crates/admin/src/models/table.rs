//! Rows of a resource index table.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// One table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Text(String),
    Bool(bool),
    Date(NaiveDate),
    Money(Decimal),
}

impl CellValue {
    #[must_use]
    pub fn opt_text(value: Option<impl Into<String>>) -> Self {
        value.map_or(Self::Null, |v| Self::Text(v.into()))
    }

    /// Cell text as shown in the table and in CSV exports.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Text(text) => text.clone(),
            Self::Bool(true) => "Yes".to_string(),
            Self::Bool(false) => "No".to_string(),
            Self::Date(date) => date.format("%b %-d, %Y").to_string(),
            Self::Money(amount) => format!("{amount:.2}"),
        }
    }
}

/// A record as shown in an index table, keyed by column key.
#[derive(Debug, Clone, Serialize)]
pub struct TableRecord {
    pub id: i32,
    cells: BTreeMap<&'static str, CellValue>,
}

impl TableRecord {
    #[must_use]
    pub fn new(id: i32) -> Self {
        Self {
            id,
            cells: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.insert(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> &CellValue {
        self.cells.get(key).unwrap_or(&CellValue::Null)
    }

    #[must_use]
    pub fn display(&self, key: &str) -> String {
        self.get(key).display()
    }

    /// Whether a boolean cell is set.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), CellValue::Bool(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).map(CellValue::Date);
        assert_eq!(date.map(|d| d.display()).as_deref(), Some("Mar 7, 2026"));
        assert_eq!(CellValue::Money(Decimal::new(75, 0)).display(), "75.00");
        assert_eq!(CellValue::Bool(true).display(), "Yes");
        assert_eq!(CellValue::Null.display(), "");
    }

    #[test]
    fn test_missing_cells_are_null() {
        let record = TableRecord::new(1).cell("is_visible", CellValue::Bool(true));
        assert!(record.flag("is_visible"));
        assert_eq!(record.get("name"), &CellValue::Null);
    }
}
