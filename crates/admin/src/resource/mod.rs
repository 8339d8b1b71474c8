//! Descriptor-driven resource engine.
//!
//! Every admin resource (brands, categories, products, orders) is a
//! [`ResourceDescriptor`]: plain data listing its form, table, navigation
//! entry and relation managers. One set of generic routes and templates
//! renders and persists all of them.

pub mod derive;
pub mod field;
pub mod form;
pub mod lookup;
pub mod panel;
pub mod rules;
pub mod state;

use std::fmt;
use std::str::FromStr;

pub use derive::{DeriveContext, Derivation, Operation, PriceBook, SchemaError, SlugPolicy};
pub use field::{FieldDescriptor, FieldKind, RelationSource};
pub use form::{FieldGroup, FormItem, FormSchema, LayoutKind, Repeater};
pub use panel::{Badge, NavGroup, NavigationItem, Panel, WidgetKind};
pub use rules::{FieldErrors, Rule, UniqueRule};
pub use state::{FieldValue, FormState};

use crate::components::data_table::DataTableConfig;

/// The resources this panel manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Brands,
    Categories,
    Products,
    Orders,
}

impl ResourceKind {
    pub const ALL: [Self; 4] = [Self::Brands, Self::Categories, Self::Products, Self::Orders];

    /// URL segment of the resource.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Brands => "brands",
            Self::Categories => "categories",
            Self::Products => "products",
            Self::Orders => "orders",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.slug() == s)
            .ok_or_else(|| format!("unknown resource: {s}"))
    }
}

/// How related records point back at their parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationLink {
    /// The related record has a column holding the parent id; `field` is
    /// the form field editing it.
    ForeignKey { field: &'static str },
    /// Link rows live in a pivot table; `field` is the multi-relation form
    /// field listing the parents.
    Pivot {
        table: &'static str,
        parent_column: &'static str,
        field: &'static str,
    },
}

impl RelationLink {
    /// Form field of the related resource that holds the link.
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::ForeignKey { field } | Self::Pivot { field, .. } => field,
        }
    }
}

/// A relation manager shown on the parent's edit page.
#[derive(Debug, Clone)]
pub struct RelationDescriptor {
    /// URL segment, e.g. `products`.
    pub name: &'static str,
    pub title: &'static str,
    pub related: ResourceKind,
    pub link: RelationLink,
}

impl RelationDescriptor {
    /// Form of a related record with the fixed link field removed.
    #[must_use]
    pub fn form(&self, related: &ResourceDescriptor) -> FormSchema {
        related.form.without_field(self.link.field())
    }

    /// Set the link to `parent_id` in a related-record submission.
    ///
    /// For pivot links the stored parents are kept and `parent_id` is
    /// added.
    pub fn link_to(&self, parent_id: i32, stored: &FormState, submitted: &mut FormState) {
        let parent = parent_id.to_string();
        match self.link {
            RelationLink::ForeignKey { field } => {
                submitted.set(field, FieldValue::Text(parent));
            }
            RelationLink::Pivot { field, .. } => {
                let mut parents = stored.list(field).to_vec();
                if !parents.contains(&parent) {
                    parents.push(parent);
                }
                submitted.set(field, FieldValue::List(parents));
            }
        }
    }
}

/// Everything the engine needs to know about one resource.
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    /// Singular label, e.g. `Brand`.
    pub model_label: &'static str,
    /// Field shown as the record's title.
    pub title_field: &'static str,
    pub navigation: NavigationItem,
    pub form: FormSchema,
    pub table: DataTableConfig,
    pub relations: Vec<RelationDescriptor>,
}

impl ResourceDescriptor {
    #[must_use]
    pub const fn slug(&self) -> &'static str {
        self.kind.slug()
    }

    #[must_use]
    pub const fn plural_label(&self) -> &'static str {
        self.navigation.label
    }

    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&RelationDescriptor> {
        self.relations.iter().find(|r| r.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_kind_slug_round_trip() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.slug().parse::<ResourceKind>(), Ok(kind));
        }
        assert!("customers".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_pivot_link_keeps_stored_parents() {
        let relation = RelationDescriptor {
            name: "products",
            title: "Products",
            related: ResourceKind::Products,
            link: RelationLink::Pivot {
                table: "category_product",
                parent_column: "category_id",
                field: "categories",
            },
        };
        let stored = FormState::new().with(
            "categories",
            FieldValue::List(vec!["2".to_string(), "5".to_string()]),
        );
        let mut submitted = FormState::new();
        relation.link_to(5, &stored, &mut submitted);
        assert_eq!(submitted.list("categories"), ["2", "5"]);

        relation.link_to(9, &stored, &mut submitted);
        assert_eq!(submitted.list("categories"), ["2", "5", "9"]);
    }

    #[test]
    fn test_foreign_key_link_sets_parent() {
        let relation = RelationDescriptor {
            name: "products",
            title: "Products",
            related: ResourceKind::Products,
            link: RelationLink::ForeignKey { field: "brand_id" },
        };
        let mut submitted = FormState::new().with("brand_id", FieldValue::text("1"));
        relation.link_to(4, &FormState::new(), &mut submitted);
        assert_eq!(submitted.text("brand_id"), Some("4"));
    }
}
