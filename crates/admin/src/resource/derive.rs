//! Derived field values.
//!
//! A derivation recomputes one target field from one or more source fields.
//! Derivations are evaluated in declaration order for each field-change
//! event: a derivation fires when any of its sources changed, either
//! directly or because an earlier derivation wrote it, and its target then
//! joins the changed set. Declaring a derivation that reads a field written
//! by a later one is rejected when the schema is built, which also rules
//! out cycles.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use catalog_core::{Price, line_total, slugify};
use rust_decimal::Decimal;
use thiserror::Error;

use super::state::{FieldValue, FormState};

/// Form operation a change event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Edit,
}

impl Operation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Edit => "edit",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "edit" => Ok(Self::Edit),
            _ => Err(format!("invalid form operation: {s}")),
        }
    }
}

/// When name-to-slug derivations fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlugPolicy {
    /// Regenerate the slug on every name change, including edits.
    #[default]
    Always,
    /// Only derive the slug while creating a record.
    CreateOnly,
}

impl FromStr for SlugPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "create_only" | "create-only" => Ok(Self::CreateOnly),
            other => Err(format!(
                "invalid slug policy '{other}', expected 'always' or 'create_only'"
            )),
        }
    }
}

/// Operations a derivation may be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum When {
    Always,
    CreateOnly,
    /// Follow the panel-wide [`SlugPolicy`].
    SlugPolicy,
}

/// How the target value is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeriveOp {
    /// `slugify` of the single source.
    Slugify,
    /// Current price of the product referenced by the single source.
    ProductPrice,
    /// Product of the two sources, as a line total.
    Multiply,
}

/// One declared dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivation {
    pub target: &'static str,
    pub sources: Vec<&'static str>,
    pub op: DeriveOp,
    pub when: When,
}

impl Derivation {
    /// Slug derived from a name field, following the slug policy.
    #[must_use]
    pub fn slug(source: &'static str, target: &'static str) -> Self {
        Self {
            target,
            sources: vec![source],
            op: DeriveOp::Slugify,
            when: When::SlugPolicy,
        }
    }

    /// Unit price copied from the selected product.
    #[must_use]
    pub fn product_price(source: &'static str, target: &'static str) -> Self {
        Self {
            target,
            sources: vec![source],
            op: DeriveOp::ProductPrice,
            when: When::Always,
        }
    }

    /// `target = left × right`.
    #[must_use]
    pub fn multiply(left: &'static str, right: &'static str, target: &'static str) -> Self {
        Self {
            target,
            sources: vec![left, right],
            op: DeriveOp::Multiply,
            when: When::Always,
        }
    }

    fn applies_to(&self, ctx: &DeriveContext<'_>) -> bool {
        match self.when {
            When::Always => true,
            When::CreateOnly => ctx.operation == Operation::Create,
            When::SlugPolicy => {
                ctx.slug_policy == SlugPolicy::Always || ctx.operation == Operation::Create
            }
        }
    }

    fn evaluate(&self, state: &FormState, ctx: &DeriveContext<'_>) -> FieldValue {
        let source = |i: usize| self.sources.get(i).and_then(|name| state.text(name));
        match self.op {
            DeriveOp::Slugify => FieldValue::opt_text(source(0).map(slugify)),
            DeriveOp::ProductPrice => match source(0) {
                None => FieldValue::Null,
                Some(id) => {
                    let price = ctx.prices.price(id).unwrap_or(Decimal::ZERO);
                    FieldValue::Text(format!("{price:.2}"))
                }
            },
            DeriveOp::Multiply => {
                let quantity = source(0).and_then(|q| q.trim().parse::<i32>().ok());
                let unit = source(1).and_then(|p| Price::parse(p).ok());
                match (quantity, unit) {
                    (Some(q), Some(p)) => FieldValue::opt_text(
                        line_total(q, p.amount()).map(|total| format!("{total:.2}")),
                    ),
                    _ => FieldValue::Null,
                }
            }
        }
    }
}

/// Snapshot of product prices keyed by product id.
#[derive(Debug, Clone, Default)]
pub struct PriceBook(HashMap<String, Decimal>);

impl PriceBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: i32, price: Decimal) {
        self.0.insert(id.to_string(), price);
    }

    #[must_use]
    pub fn price(&self, id: &str) -> Option<Decimal> {
        self.0.get(id.trim()).copied()
    }
}

impl FromIterator<(i32, Decimal)> for PriceBook {
    fn from_iter<T: IntoIterator<Item = (i32, Decimal)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(id, p)| (id.to_string(), p)).collect())
    }
}

/// Inputs a derivation may read besides the form itself.
#[derive(Debug, Clone, Copy)]
pub struct DeriveContext<'a> {
    pub operation: Operation,
    pub slug_policy: SlugPolicy,
    pub prices: &'a PriceBook,
}

/// Errors in a derivation declaration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("derivation of '{target}' reads '{field}', which is written by a later derivation")]
    OutOfOrder {
        target: &'static str,
        field: &'static str,
    },
    #[error("derivation refers to unknown field '{0}'")]
    UnknownField(&'static str),
    #[error("field '{0}' is derived more than once")]
    DuplicateTarget(&'static str),
}

/// Ordered set of derivations for one form (or one repeater row).
#[derive(Debug, Clone, Default)]
pub struct Derivations(Vec<Derivation>);

impl Derivations {
    /// Validate declaration order.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::OutOfOrder` when a derivation reads (directly
    /// or as its own target) a field written at the same position or later,
    /// and `SchemaError::DuplicateTarget` when two derivations write the
    /// same field.
    pub fn new(list: Vec<Derivation>) -> Result<Self, SchemaError> {
        for (i, derivation) in list.iter().enumerate() {
            if list
                .iter()
                .skip(i + 1)
                .any(|later| later.target == derivation.target)
            {
                return Err(SchemaError::DuplicateTarget(derivation.target));
            }
            for source in &derivation.sources {
                if list.iter().skip(i).any(|later| later.target == *source) {
                    return Err(SchemaError::OutOfOrder {
                        target: derivation.target,
                        field: *source,
                    });
                }
            }
        }
        Ok(Self(list))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Derivation> {
        self.0.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether some derivation writes `field`.
    #[must_use]
    pub fn derives(&self, field: &str) -> bool {
        self.0.iter().any(|d| d.target == field)
    }

    /// Apply one change event.
    ///
    /// `changed` holds the fields the event changed and gains every target
    /// that was recomputed. `always` names targets that are refreshed even
    /// without a changed source (presentational values).
    pub fn apply(
        &self,
        state: &mut FormState,
        changed: &mut BTreeSet<String>,
        ctx: &DeriveContext<'_>,
        always: impl Fn(&str) -> bool,
    ) {
        for derivation in &self.0 {
            let triggered = derivation.sources.iter().any(|s| changed.contains(*s));
            if !(triggered || always(derivation.target)) || !derivation.applies_to(ctx) {
                continue;
            }
            let value = derivation.evaluate(state, ctx);
            if state.get(derivation.target) != Some(&value) {
                changed.insert(derivation.target.to_string());
            }
            state.set(derivation.target, value);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ctx<'a>(operation: Operation, policy: SlugPolicy, prices: &'a PriceBook) -> DeriveContext<'a> {
        DeriveContext {
            operation,
            slug_policy: policy,
            prices,
        }
    }

    fn changed(fields: &[&str]) -> BTreeSet<String> {
        fields.iter().map(|f| (*f).to_string()).collect()
    }

    fn line_item() -> Derivations {
        Derivations::new(vec![
            Derivation::product_price("product_id", "unit_price"),
            Derivation::multiply("quantity", "unit_price", "total"),
        ])
        .unwrap()
    }

    #[test]
    fn test_out_of_order_declaration_is_rejected() {
        let result = Derivations::new(vec![
            Derivation::multiply("quantity", "unit_price", "total"),
            Derivation::product_price("product_id", "unit_price"),
        ]);
        assert_eq!(
            result.err(),
            Some(SchemaError::OutOfOrder {
                target: "total",
                field: "unit_price"
            })
        );
    }

    #[test]
    fn test_self_reference_is_rejected() {
        let result = Derivations::new(vec![Derivation::slug("slug", "slug")]);
        assert!(matches!(result, Err(SchemaError::OutOfOrder { .. })));
    }

    #[test]
    fn test_duplicate_target_is_rejected() {
        let result = Derivations::new(vec![
            Derivation::slug("name", "slug"),
            Derivation::slug("title", "slug"),
        ]);
        assert_eq!(result.err(), Some(SchemaError::DuplicateTarget("slug")));
    }

    #[test]
    fn test_slug_follows_name_change() {
        let derivations = Derivations::new(vec![Derivation::slug("name", "slug")]).unwrap();
        let prices = PriceBook::new();
        let mut state = FormState::new().with("name", FieldValue::text("Running Shoes"));
        let mut set = changed(&["name"]);
        derivations.apply(
            &mut state,
            &mut set,
            &ctx(Operation::Create, SlugPolicy::Always, &prices),
            |_| false,
        );
        assert_eq!(state.text("slug"), Some("running-shoes"));
        assert!(set.contains("slug"));
    }

    #[test]
    fn test_create_only_policy_keeps_slug_on_edit() {
        let derivations = Derivations::new(vec![Derivation::slug("name", "slug")]).unwrap();
        let prices = PriceBook::new();
        let mut state = FormState::new()
            .with("name", FieldValue::text("Renamed"))
            .with("slug", FieldValue::text("original"));
        let mut set = changed(&["name"]);
        derivations.apply(
            &mut state,
            &mut set,
            &ctx(Operation::Edit, SlugPolicy::CreateOnly, &prices),
            |_| false,
        );
        assert_eq!(state.text("slug"), Some("original"));

        derivations.apply(
            &mut state,
            &mut set,
            &ctx(Operation::Edit, SlugPolicy::Always, &prices),
            |_| false,
        );
        assert_eq!(state.text("slug"), Some("renamed"));
    }

    #[test]
    fn test_product_selection_cascades_to_total() {
        let prices: PriceBook = [(7, Decimal::new(2500, 2))].into_iter().collect();
        let mut row = FormState::new()
            .with("product_id", FieldValue::text("7"))
            .with("quantity", FieldValue::text("3"));
        let mut set = changed(&["product_id"]);
        line_item().apply(
            &mut row,
            &mut set,
            &ctx(Operation::Create, SlugPolicy::Always, &prices),
            |_| false,
        );
        assert_eq!(row.text("unit_price"), Some("25.00"));
        assert_eq!(row.text("total"), Some("75.00"));
        assert!(set.contains("unit_price") && set.contains("total"));
    }

    #[test]
    fn test_quantity_change_recomputes_total_only() {
        let prices = PriceBook::new();
        let mut row = FormState::new()
            .with("product_id", FieldValue::text("7"))
            .with("quantity", FieldValue::text("2"))
            .with("unit_price", FieldValue::text("25.00"));
        let mut set = changed(&["quantity"]);
        line_item().apply(
            &mut row,
            &mut set,
            &ctx(Operation::Edit, SlugPolicy::Always, &prices),
            |_| false,
        );
        assert_eq!(row.text("unit_price"), Some("25.00"));
        assert_eq!(row.text("total"), Some("50.00"));
    }

    #[test]
    fn test_unknown_product_prices_at_zero() {
        let prices = PriceBook::new();
        let mut row = FormState::new().with("product_id", FieldValue::text("404"));
        let mut set = changed(&["product_id"]);
        line_item().apply(
            &mut row,
            &mut set,
            &ctx(Operation::Create, SlugPolicy::Always, &prices),
            |_| false,
        );
        assert_eq!(row.text("unit_price"), Some("0.00"));
        assert_eq!(row.get("total"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_always_refreshes_presentational_target() {
        let prices = PriceBook::new();
        let mut row = FormState::new()
            .with("quantity", FieldValue::text("3"))
            .with("unit_price", FieldValue::text("25.00"));
        let mut set = BTreeSet::new();
        line_item().apply(
            &mut row,
            &mut set,
            &ctx(Operation::Edit, SlugPolicy::Always, &prices),
            |target| target == "total",
        );
        assert_eq!(row.text("total"), Some("75.00"));
        assert_eq!(row.get("unit_price"), Some(&FieldValue::text("25.00")));
    }

    #[test]
    fn test_out_of_range_unit_price_clears_total() {
        let prices = PriceBook::new();
        let mut row = FormState::new()
            .with("quantity", FieldValue::text("2147483647"))
            .with("unit_price", FieldValue::text("79228162514264337593543950335"));
        let mut set = changed(&["quantity"]);
        line_item().apply(
            &mut row,
            &mut set,
            &ctx(Operation::Edit, SlugPolicy::Always, &prices),
            |_| false,
        );
        assert_eq!(row.get("total"), Some(&FieldValue::Null));

        row.set("unit_price", FieldValue::text("999999.99"));
        line_item().apply(
            &mut row,
            &mut changed(&["quantity"]),
            &ctx(Operation::Edit, SlugPolicy::Always, &prices),
            |_| false,
        );
        assert_eq!(row.text("total"), Some("2147483625525163.53"));
    }

    #[test]
    fn test_slug_policy_parse() {
        assert_eq!("always".parse(), Ok(SlugPolicy::Always));
        assert_eq!("CREATE_ONLY".parse(), Ok(SlugPolicy::CreateOnly));
        assert!("sometimes".parse::<SlugPolicy>().is_err());
    }
}
