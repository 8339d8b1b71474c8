//! Form state: the values of one form, keyed by field name.
//!
//! Submissions arrive as flat `(key, value)` pairs. Repeater rows use the
//! `items[0][quantity]` key shape and multi-selects use `categories[]`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Text(String),
    List(Vec<String>),
    Rows(Vec<FormState>),
}

impl FieldValue {
    /// Text value; empty input is normalized to `Null`.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Self::Null
        } else if trimmed.len() == value.len() {
            Self::Text(value)
        } else {
            Self::Text(trimmed.to_string())
        }
    }

    /// Text for an optional value.
    #[must_use]
    pub fn opt_text(value: Option<impl Into<String>>) -> Self {
        value.map_or(Self::Null, Self::text)
    }

    /// Whether the value counts as "filled" for required checks.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(_) => false,
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Rows(rows) => rows.is_empty(),
        }
    }

    /// The text content, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Values of one form (or one repeater row).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormState {
    values: BTreeMap<String, FieldValue>,
}

impl FormState {
    /// Create an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, name: &str, value: FieldValue) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field value.
    pub fn set(&mut self, name: &str, value: FieldValue) {
        self.values.insert(name.to_string(), value);
    }

    /// Remove a field.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.values.remove(name)
    }

    /// Get a field value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Whether the field has been set (even to `Null`).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Text value of a field.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    /// Boolean value of a field (`false` when absent).
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.get(name), Some(FieldValue::Bool(true)))
    }

    /// List value of a field (empty when absent).
    #[must_use]
    pub fn list(&self, name: &str) -> &[String] {
        match self.get(name) {
            Some(FieldValue::List(items)) => items,
            _ => &[],
        }
    }

    /// Repeater rows of a field (empty when absent).
    #[must_use]
    pub fn rows(&self, name: &str) -> &[FormState] {
        match self.get(name) {
            Some(FieldValue::Rows(rows)) => rows,
            _ => &[],
        }
    }

    /// Mutable repeater rows, creating an empty list when absent.
    pub fn rows_mut(&mut self, name: &str) -> &mut Vec<FormState> {
        let entry = self
            .values
            .entry(name.to_string())
            .or_insert_with(|| FieldValue::Rows(Vec::new()));
        if !matches!(entry, FieldValue::Rows(_)) {
            *entry = FieldValue::Rows(Vec::new());
        }
        match entry {
            FieldValue::Rows(rows) => rows,
            _ => unreachable!("entry was just set to rows"),
        }
    }

    /// Iterate over all fields.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parse a flat submission.
    ///
    /// Keys of the shape `name[index][field]` build repeater rows (ordered by
    /// index), `name[]` accumulates a list, and plain keys are text with the
    /// last occurrence winning. Keys starting with `_` are control values
    /// and are skipped.
    #[must_use]
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut state = Self::new();
        let mut rows: BTreeMap<String, BTreeMap<usize, Self>> = BTreeMap::new();

        for (key, value) in pairs {
            if key.starts_with('_') {
                continue;
            }
            if let Some(list_name) = key.strip_suffix("[]") {
                match state.values.get_mut(list_name) {
                    Some(FieldValue::List(items)) => items.push(value.clone()),
                    _ => {
                        let items = if value.trim().is_empty() {
                            Vec::new()
                        } else {
                            vec![value.clone()]
                        };
                        state.set(list_name, FieldValue::List(items));
                    }
                }
                continue;
            }
            if let Some((name, index, field)) = parse_row_key(key) {
                rows.entry(name.to_string())
                    .or_default()
                    .entry(index)
                    .or_default()
                    .set(field, FieldValue::text(value.clone()));
                continue;
            }
            state.set(key, FieldValue::text(value.clone()));
        }

        for (name, indexed) in rows {
            state.set(&name, FieldValue::Rows(indexed.into_values().collect()));
        }

        // Empty placeholders from `name[]` hidden inputs leave an empty list.
        for value in state.values.values_mut() {
            if let FieldValue::List(items) = value {
                items.retain(|item| !item.trim().is_empty());
            }
        }

        state
    }
}

/// Split `items[3][unit_price]` into `("items", 3, "unit_price")`.
fn parse_row_key(key: &str) -> Option<(&str, usize, &str)> {
    let (name, rest) = key.split_once('[')?;
    let (index, rest) = rest.split_once("][")?;
    let field = rest.strip_suffix(']')?;
    if name.is_empty() || field.is_empty() || field.contains('[') {
        return None;
    }
    Some((name, index.parse().ok()?, field))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_plain_fields_are_trimmed_and_nulled() {
        let state = FormState::from_pairs(&pairs(&[("name", "  Acme  "), ("url", "   ")]));
        assert_eq!(state.text("name"), Some("Acme"));
        assert_eq!(state.get("url"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_repeater_rows_are_ordered_by_index() {
        let state = FormState::from_pairs(&pairs(&[
            ("items[1][quantity]", "5"),
            ("items[0][quantity]", "2"),
            ("items[0][product_id]", "7"),
        ]));
        let rows = state.rows("items");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text("quantity"), Some("2"));
        assert_eq!(rows[0].text("product_id"), Some("7"));
        assert_eq!(rows[1].text("quantity"), Some("5"));
    }

    #[test]
    fn test_list_fields_accumulate() {
        let state = FormState::from_pairs(&pairs(&[
            ("categories[]", ""),
            ("categories[]", "3"),
            ("categories[]", "9"),
        ]));
        assert_eq!(state.list("categories"), ["3", "9"]);
    }

    #[test]
    fn test_control_keys_are_skipped() {
        let state = FormState::from_pairs(&pairs(&[("_changed", "name"), ("name", "A")]));
        assert!(!state.contains("_changed"));
    }

    #[test]
    fn test_parse_row_key_rejects_malformed() {
        assert_eq!(parse_row_key("items[0][qty]"), Some(("items", 0, "qty")));
        assert_eq!(parse_row_key("items[x][qty]"), None);
        assert_eq!(parse_row_key("items[0]"), None);
        assert_eq!(parse_row_key("[0][qty]"), None);
    }
}
