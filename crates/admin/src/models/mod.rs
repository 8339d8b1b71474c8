//! Domain models for the catalog admin.
//!
//! Each model converts to a [`FormState`] for the edit form and is built
//! back from a validated, dehydrated state through its `*Input` type.

pub mod brand;
pub mod category;
pub mod customer;
pub mod order;
pub mod product;
pub mod table;

use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;

use crate::resource::FormState;

pub use brand::{Brand, BrandInput};
pub use category::{Category, CategoryInput};
pub use customer::Customer;
pub use order::{Order, OrderInput, OrderItem, OrderItemInput};
pub use product::{Product, ProductInput};
pub use table::{CellValue, TableRecord};

/// Errors turning a form state into a typed input.
///
/// Validation runs first, so these indicate a form/model mismatch rather
/// than bad operator input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("missing value for '{0}'")]
    Missing(&'static str),

    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub(crate) fn required_text(state: &FormState, field: &'static str) -> Result<String, InputError> {
    state
        .text(field)
        .map(ToString::to_string)
        .ok_or(InputError::Missing(field))
}

pub(crate) fn optional_text(state: &FormState, field: &str) -> Option<String> {
    state.text(field).map(ToString::to_string)
}

pub(crate) fn parse_required<T>(state: &FormState, field: &'static str) -> Result<T, InputError>
where
    T: FromStr,
    T::Err: Display,
{
    parse_optional(state, field)?.ok_or(InputError::Missing(field))
}

pub(crate) fn parse_optional<T>(state: &FormState, field: &'static str) -> Result<Option<T>, InputError>
where
    T: FromStr,
    T::Err: Display,
{
    state
        .text(field)
        .map(|text| {
            text.trim().parse().map_err(|e: T::Err| InputError::Invalid {
                field,
                reason: e.to_string(),
            })
        })
        .transpose()
}

pub(crate) fn id_list(state: &FormState, field: &'static str) -> Result<Vec<i32>, InputError> {
    state
        .list(field)
        .iter()
        .map(|id| {
            id.trim().parse().map_err(|_| InputError::Invalid {
                field,
                reason: format!("'{id}' is not an id"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::FieldValue;

    #[test]
    fn test_parse_helpers() {
        let state = FormState::new()
            .with("quantity", FieldValue::text("3"))
            .with("bad", FieldValue::text("x"))
            .with("ids", FieldValue::List(vec!["1".to_string(), "4".to_string()]));
        assert_eq!(parse_required::<i32>(&state, "quantity"), Ok(3));
        assert_eq!(parse_optional::<i32>(&state, "missing"), Ok(None));
        assert_eq!(
            parse_required::<i32>(&state, "missing"),
            Err(InputError::Missing("missing"))
        );
        assert!(matches!(
            parse_required::<i32>(&state, "bad"),
            Err(InputError::Invalid { field: "bad", .. })
        ));
        assert_eq!(id_list(&state, "ids"), Ok(vec![1, 4]));
    }
}
