//! Brand model.

use catalog_core::{BrandId, HexColor, Slug};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{InputError, TableRecord, optional_text, required_text};
use crate::models::CellValue;
use crate::resource::{FieldValue, FormState};

/// A product brand.
#[derive(Debug, Clone, Serialize)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    pub slug: Slug,
    pub url: String,
    pub description: Option<String>,
    pub is_visible: bool,
    pub primary_hex: Option<HexColor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Brand {
    /// Values for the edit form.
    #[must_use]
    pub fn to_state(&self) -> FormState {
        FormState::new()
            .with("name", FieldValue::text(&self.name))
            .with("slug", FieldValue::text(self.slug.as_str()))
            .with("url", FieldValue::text(&self.url))
            .with("description", FieldValue::opt_text(self.description.clone()))
            .with("is_visible", FieldValue::Bool(self.is_visible))
            .with(
                "primary_hex",
                FieldValue::opt_text(self.primary_hex.as_ref().map(HexColor::as_str)),
            )
    }

    #[must_use]
    pub fn table_record(&self) -> TableRecord {
        TableRecord::new(self.id.as_i32())
            .cell("name", CellValue::Text(self.name.clone()))
            .cell("url", CellValue::Text(self.url.clone()))
            .cell(
                "primary_hex",
                CellValue::opt_text(self.primary_hex.as_ref().map(HexColor::as_str)),
            )
            .cell("is_visible", CellValue::Bool(self.is_visible))
            .cell("updated_at", CellValue::Date(self.updated_at.date_naive()))
    }
}

/// Values written when creating or updating a brand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandInput {
    pub name: String,
    pub slug: Slug,
    pub url: String,
    pub description: Option<String>,
    pub is_visible: bool,
    pub primary_hex: Option<HexColor>,
}

impl BrandInput {
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
        let primary_hex = optional_text(state, "primary_hex")
            .map(|hex| HexColor::parse(&hex))
            .transpose()
            .map_err(|e| InputError::Invalid {
                field: "primary_hex",
                reason: e.to_string(),
            })?;

        Ok(Self {
            name: required_text(state, "name")?,
            slug,
            url: required_text(state, "url")?,
            description: optional_text(state, "description"),
            is_visible: state.flag("is_visible"),
            primary_hex,
        })
    }
}
