//! Validation rules and per-field error collection.
//!
//! Rules come in two flavours: synchronous checks that only look at the
//! submitted value, and lookup rules (`Unique`, `Exists`, `NoCategoryCycle`)
//! that need the database and go through [`super::lookup::ValidationLookup`].

use std::collections::BTreeMap;

use catalog_core::{HexColor, Price};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::field::{FieldKind, RelationSource};
use super::state::FieldValue;

/// Uniqueness constraint on a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniqueRule {
    pub table: &'static str,
    pub column: &'static str,
}

impl UniqueRule {
    /// Name of the storage constraint backing this rule.
    ///
    /// Migrations name unique constraints `{table}_{column}_key`, which is
    /// also what Postgres picks for an unnamed `UNIQUE` column.
    #[must_use]
    pub fn constraint_name(&self) -> String {
        format!("{}_{}_key", self.table, self.column)
    }
}

/// Message for a value already used by another record.
#[must_use]
pub fn unique_message(label: &str) -> String {
    format!("The {} has already been taken.", label.to_lowercase())
}

/// A validation rule attached to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Required,
    /// Required when creating; editing keeps the stored value.
    RequiredOnCreate,
    /// Whole number that fits an `INTEGER` column.
    Integer,
    Decimal,
    /// Calendar date as `YYYY-MM-DD`.
    Date,
    MinValue(i64),
    PricePattern,
    HexColor,
    Url,
    /// `OR-` followed by six digits.
    OrderNumber,
    /// Value must be one of the field's select options.
    InOptions,
    Unique(UniqueRule),
    Exists(RelationSource),
    /// Parent category must not be the record itself or one of its
    /// descendants.
    NoCategoryCycle,
}

impl Rule {
    /// Whether the rule needs a database lookup.
    #[must_use]
    pub const fn needs_lookup(&self) -> bool {
        matches!(
            self,
            Self::Unique(_) | Self::Exists(_) | Self::NoCategoryCycle
        )
    }

    /// Run a synchronous rule against a value.
    ///
    /// Blank values only fail `Required`; every other rule treats a blank
    /// value as "nothing to check". Lookup rules and `RequiredOnCreate`,
    /// which depends on the form operation, always pass here.
    #[must_use]
    pub fn check(&self, label: &str, kind: &FieldKind, value: &FieldValue) -> Option<String> {
        if let Self::Required = self {
            return value
                .is_blank()
                .then(|| format!("The {} field is required.", label.to_lowercase()));
        }
        if value.is_blank() {
            return None;
        }
        let text = value.as_text();

        match self {
            Self::Integer => {
                let text = text?;
                if text.parse::<i64>().is_err() {
                    Some(format!("The {} field must be an integer.", label.to_lowercase()))
                } else {
                    text.parse::<i32>().is_err().then(|| {
                        format!(
                            "The {} field must be between {} and {}.",
                            label.to_lowercase(),
                            i32::MIN,
                            i32::MAX
                        )
                    })
                }
            }
            Self::Date => text
                .filter(|t| t.parse::<NaiveDate>().is_err())
                .map(|_| format!("The {} field must be a valid date.", label.to_lowercase())),
            Self::Decimal => text
                .filter(|t| t.parse::<Decimal>().is_err())
                .map(|_| format!("The {} field must be a number.", label.to_lowercase())),
            Self::MinValue(min) => {
                let number = text.and_then(|t| t.parse::<Decimal>().ok())?;
                (number < Decimal::from(*min)).then(|| {
                    format!(
                        "The {} field must be at least {min}.",
                        label.to_lowercase()
                    )
                })
            }
            Self::PricePattern => text.filter(|t| Price::parse(t).is_err()).map(|_| {
                format!(
                    "The {} field must be a price with up to 6 digits and 2 decimals.",
                    label.to_lowercase()
                )
            }),
            Self::HexColor => text
                .filter(|t| HexColor::parse(t).is_err())
                .map(|_| format!("The {} field must be a hex color.", label.to_lowercase())),
            Self::Url => text
                .filter(|t| !is_http_url(t))
                .map(|_| format!("The {} field must be a valid URL.", label.to_lowercase())),
            Self::OrderNumber => text.filter(|t| !is_order_number(t)).map(|_| {
                format!(
                    "The {} field must look like OR-123456.",
                    label.to_lowercase()
                )
            }),
            Self::InOptions => {
                let FieldKind::Select(options) = kind else {
                    return None;
                };
                let selected = text?;
                (!options.iter().any(|o| o.value == selected))
                    .then(|| format!("The selected {} is invalid.", label.to_lowercase()))
            }
            Self::Required
            | Self::RequiredOnCreate
            | Self::Unique(_)
            | Self::Exists(_)
            | Self::NoCategoryCycle => None,
        }
    }
}

fn is_order_number(value: &str) -> bool {
    value
        .strip_prefix("OR-")
        .is_some_and(|digits| digits.len() == 6 && digits.bytes().all(|b| b.is_ascii_digit()))
}

fn is_http_url(value: &str) -> bool {
    url::Url::parse(value).is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
}

/// Validation messages keyed by field path.
///
/// Repeater fields use `items.0.quantity` paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(field.into()).or_default().push(message.into());
    }

    /// Merge another set of errors into this one.
    pub fn extend(&mut self, other: Self) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// First message for a field, for inline display.
    #[must_use]
    pub fn first(&self, field: &str) -> Option<&str> {
        self.errors
            .get(field)
            .and_then(|m| m.first())
            .map(String::as_str)
    }

    /// Every message for a field.
    #[must_use]
    pub fn messages(&self, field: &str) -> &[String] {
        self.errors.get(field).map_or(&[], Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }
}

/// Error path for a field inside a repeater row.
#[must_use]
pub fn row_path(repeater: &str, index: usize, field: &str) -> String {
    format!("{repeater}.{index}.{field}")
}
