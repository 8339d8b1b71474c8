//! Category model.

use catalog_core::{CategoryId, Slug};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{CellValue, InputError, TableRecord, optional_text, parse_optional, required_text};
use crate::resource::{FieldValue, FormState};

/// A product category, optionally nested under a parent.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub parent_id: Option<CategoryId>,
    pub parent_name: Option<String>,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Values for the edit form.
    #[must_use]
    pub fn to_state(&self) -> FormState {
        FormState::new()
            .with("name", FieldValue::text(&self.name))
            .with("slug", FieldValue::text(self.slug.as_str()))
            .with("description", FieldValue::opt_text(self.description.clone()))
            .with("is_visible", FieldValue::Bool(self.is_visible))
            .with(
                "parent_id",
                FieldValue::opt_text(self.parent_id.map(|id| id.to_string())),
            )
    }

    #[must_use]
    pub fn table_record(&self) -> TableRecord {
        TableRecord::new(self.id.as_i32())
            .cell("name", CellValue::Text(self.name.clone()))
            .cell("parent_name", CellValue::opt_text(self.parent_name.clone()))
            .cell("is_visible", CellValue::Bool(self.is_visible))
            .cell("updated_at", CellValue::Date(self.updated_at.date_naive()))
    }
}

/// Values written when creating or updating a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInput {
    pub parent_id: Option<CategoryId>,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub is_visible: bool,
}

impl CategoryInput {
    /// Build from a dehydrated form state.
    ///
    /// # Errors
    ///
    /// Returns `InputError` if a required value is missing or malformed.
    pub fn from_state(state: &FormState) -> Result<Self, InputError> {
        let slug = Slug::parse(&required_text(state, "slug")?).map_err(|e| InputError::Invalid {
            field: "slug",
            reason: e.to_string(),
        })?;
        Ok(Self {
            parent_id: parse_optional::<i32>(state, "parent_id")?.map(CategoryId::new),
            name: required_text(state, "name")?,
            slug,
            description: optional_text(state, "description"),
            is_visible: state.flag("is_visible"),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_parent_is_root() {
        let state = FormState::new()
            .with("name", FieldValue::text("Shoes"))
            .with("slug", FieldValue::text("shoes"))
            .with("parent_id", FieldValue::Null);
        let input = CategoryInput::from_state(&state).unwrap();
        assert_eq!(input.parent_id, None);
        assert!(!input.is_visible);
    }
}
