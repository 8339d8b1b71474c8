//! Product model.

use catalog_core::{BrandId, CategoryId, Price, ProductId, ProductType, Slug};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::{
    CellValue, InputError, TableRecord, id_list, optional_text, parse_optional, parse_required,
    required_text,
};
use crate::resource::{FieldValue, FormState};

/// A catalog product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub brand_id: BrandId,
    pub brand_name: Option<String>,
    pub name: String,
    pub slug: Slug,
    pub sku: String,
    /// Storage path of the uploaded image, relative to the storage root.
    pub image: Option<String>,
    pub description: Option<String>,
    pub quantity: i32,
    pub price: Price,
    pub is_visible: bool,
    pub is_featured: bool,
    pub product_type: Option<ProductType>,
    pub published_at: Option<NaiveDate>,
    /// Only loaded for single-record reads.
    pub category_ids: Vec<CategoryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Values for the edit form.
    #[must_use]
    pub fn to_state(&self) -> FormState {
        FormState::new()
            .with("name", FieldValue::text(&self.name))
            .with("slug", FieldValue::text(self.slug.as_str()))
            .with("description", FieldValue::opt_text(self.description.clone()))
            .with("sku", FieldValue::text(&self.sku))
            .with("price", FieldValue::Text(self.price.to_string()))
            .with("quantity", FieldValue::Text(self.quantity.to_string()))
            .with(
                "type",
                FieldValue::opt_text(self.product_type.map(|t| t.as_str())),
            )
            .with("is_visible", FieldValue::Bool(self.is_visible))
            .with("is_featured", FieldValue::Bool(self.is_featured))
            .with(
                "published_at",
                FieldValue::opt_text(self.published_at.map(|d| d.to_string())),
            )
            .with("image", FieldValue::opt_text(self.image.clone()))
            .with("brand_id", FieldValue::Text(self.brand_id.to_string()))
            .with(
                "categories",
                FieldValue::List(self.category_ids.iter().map(ToString::to_string).collect()),
            )
    }

    #[must_use]
    pub fn table_record(&self) -> TableRecord {
        TableRecord::new(self.id.as_i32())
            .cell("image", CellValue::opt_text(self.image.clone()))
            .cell("name", CellValue::Text(self.name.clone()))
            .cell("brand_name", CellValue::opt_text(self.brand_name.clone()))
            .cell("is_visible", CellValue::Bool(self.is_visible))
            .cell("price", CellValue::Money(self.price.amount()))
            .cell("quantity", CellValue::Text(self.quantity.to_string()))
            .cell(
                "published_at",
                self.published_at.map_or(CellValue::Null, CellValue::Date),
            )
            .cell(
                "type",
                CellValue::opt_text(self.product_type.map(|t| t.label())),
            )
    }
}

/// Values written when creating or updating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub brand_id: BrandId,
    pub name: String,
    pub slug: Slug,
    pub sku: String,
    /// `None` keeps the stored image.
    pub image: Option<String>,
    pub description: Option<String>,
    pub quantity: i32,
    pub price: Price,
    pub is_visible: bool,
    pub is_featured: bool,
    pub product_type: Option<ProductType>,
    pub published_at: Option<NaiveDate>,
    pub category_ids: Vec<CategoryId>,
}

impl ProductInput {
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
            brand_id: BrandId::new(parse_required(state, "brand_id")?),
            name: required_text(state, "name")?,
            slug,
            sku: required_text(state, "sku")?,
            image: optional_text(state, "image"),
            description: optional_text(state, "description"),
            quantity: parse_required(state, "quantity")?,
            price: parse_required(state, "price")?,
            is_visible: state.flag("is_visible"),
            is_featured: state.flag("is_featured"),
            product_type: parse_optional(state, "type")?,
            published_at: parse_optional(state, "published_at")?,
            category_ids: id_list(state, "categories")?
                .into_iter()
                .map(CategoryId::new)
                .collect(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn state() -> FormState {
        FormState::new()
            .with("name", FieldValue::text("Trail Runner"))
            .with("slug", FieldValue::text("trail-runner"))
            .with("sku", FieldValue::text("TR-1"))
            .with("price", FieldValue::text("129.90"))
            .with("quantity", FieldValue::text("12"))
            .with("type", FieldValue::text("deliverable"))
            .with("published_at", FieldValue::text("2026-03-01"))
            .with("brand_id", FieldValue::text("2"))
            .with(
                "categories",
                FieldValue::List(vec!["1".to_string(), "3".to_string()]),
            )
            .with("is_visible", FieldValue::Bool(true))
    }

    #[test]
    fn test_input_from_state() {
        let input = ProductInput::from_state(&state()).unwrap();
        assert_eq!(input.price.amount(), Decimal::new(12990, 2));
        assert_eq!(input.product_type, Some(ProductType::Deliverable));
        assert_eq!(input.category_ids, vec![CategoryId::new(1), CategoryId::new(3)]);
        assert_eq!(input.image, None);
        assert!(input.is_visible && !input.is_featured);
    }

    #[test]
    fn test_input_rejects_bad_price() {
        let state = state().with("price", FieldValue::text("12.345"));
        assert!(matches!(
            ProductInput::from_state(&state),
            Err(InputError::Invalid { field: "price", .. })
        ));
    }
}
