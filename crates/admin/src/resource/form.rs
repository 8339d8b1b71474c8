//! Form schemas and the submission pipeline.
//!
//! A [`FormSchema`] groups fields into sections, tabs or wizard steps and
//! owns the derivations between them. Submitting a form goes through
//! [`FormSchema::submit`] (merge over the stored record, recompute derived
//! values), [`FormSchema::validate`] and [`FormSchema::dehydrate`].

use std::collections::BTreeSet;

use chrono::Utc;

use crate::db::RepositoryError;

use super::derive::{DeriveContext, DeriveOp, Derivation, Derivations, Operation, SchemaError};
use super::field::{FieldDefault, FieldDescriptor, FieldKind};
use super::lookup::ValidationLookup;
use super::rules::{FieldErrors, Rule, row_path, unique_message};
use super::state::{FieldValue, FormState};

/// Hidden row key carrying the stored id of a repeater row.
pub const ROW_ID: &str = "id";

/// How field groups are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// Stacked sections, optionally split into a main and an aside column.
    Sections,
    Tabs,
    /// Sequential steps; every step is still submitted together.
    Wizard,
}

/// Repeated group of fields stored as child records (order items).
#[derive(Debug, Clone)]
pub struct Repeater {
    pub name: &'static str,
    pub label: String,
    pub fields: Vec<FieldDescriptor>,
    pub derivations: Derivations,
    pub min_items: usize,
    pub default_items: usize,
    pub columns: u8,
}

impl Repeater {
    #[must_use]
    pub fn new(name: &'static str, label: &str, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name,
            label: label.to_string(),
            columns: u8::try_from(fields.len()).unwrap_or(4).clamp(1, 4),
            fields,
            derivations: Derivations::default(),
            min_items: 0,
            default_items: 1,
        }
    }

    /// Declare the per-row derivations.
    ///
    /// # Errors
    ///
    /// Returns a `SchemaError` if the derivations are out of order or name
    /// fields the row does not have.
    pub fn with_derivations(mut self, list: Vec<Derivation>) -> Result<Self, SchemaError> {
        check_known_fields(&list, |name| self.fields.iter().any(|f| f.name == name))?;
        self.derivations = Derivations::new(list)?;
        Ok(self)
    }

    #[must_use]
    pub const fn min_items(mut self, min: usize) -> Self {
        self.min_items = min;
        self
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// A fresh row with field defaults and derived values.
    #[must_use]
    pub fn default_row(&self, ctx: &DeriveContext<'_>) -> FormState {
        let mut row = defaults_for(&self.fields);
        self.refresh_row(&mut row, &mut BTreeSet::new(), ctx);
        row
    }

    fn refresh_row(&self, row: &mut FormState, changed: &mut BTreeSet<String>, ctx: &DeriveContext<'_>) {
        self.derivations
            .apply(row, changed, ctx, |target| is_computed(&self.fields, target));
    }
}

/// Item placed inside a group.
#[derive(Debug, Clone)]
pub enum FormItem {
    Field(FieldDescriptor),
    Repeater(Repeater),
}

/// A section, tab or wizard step.
#[derive(Debug, Clone)]
pub struct FieldGroup {
    pub title: String,
    pub columns: u8,
    /// Rendered in the narrow side column of a sections layout.
    pub aside: bool,
    pub collapsible: bool,
    pub items: Vec<FormItem>,
}

impl FieldGroup {
    #[must_use]
    pub fn new(title: &str, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            title: title.to_string(),
            columns: 1,
            aside: false,
            collapsible: false,
            items: fields.into_iter().map(FormItem::Field).collect(),
        }
    }

    #[must_use]
    pub fn repeater(title: &str, repeater: Repeater) -> Self {
        Self {
            title: title.to_string(),
            columns: 1,
            aside: false,
            collapsible: false,
            items: vec![FormItem::Repeater(repeater)],
        }
    }

    #[must_use]
    pub const fn columns(mut self, columns: u8) -> Self {
        self.columns = columns;
        self
    }

    #[must_use]
    pub const fn aside(mut self) -> Self {
        self.aside = true;
        self
    }

    #[must_use]
    pub const fn collapsible(mut self) -> Self {
        self.collapsible = true;
        self
    }
}

/// Create/edit form of a resource.
#[derive(Debug, Clone)]
pub struct FormSchema {
    pub layout: LayoutKind,
    pub groups: Vec<FieldGroup>,
    derivations: Derivations,
}

impl FormSchema {
    /// Build a schema.
    ///
    /// # Errors
    ///
    /// Returns a `SchemaError` if a derivation names an unknown field or the
    /// derivations are not declared in evaluation order.
    pub fn new(
        layout: LayoutKind,
        groups: Vec<FieldGroup>,
        derivations: Vec<Derivation>,
    ) -> Result<Self, SchemaError> {
        let mut schema = Self {
            layout,
            groups,
            derivations: Derivations::default(),
        };
        check_known_fields(&derivations, |name| schema.field(name).is_some())?;
        schema.derivations = Derivations::new(derivations)?;
        Ok(schema)
    }

    /// Top-level fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.groups.iter().flat_map(|g| &g.items).filter_map(|item| match item {
            FormItem::Field(field) => Some(field),
            FormItem::Repeater(_) => None,
        })
    }

    pub fn repeaters(&self) -> impl Iterator<Item = &Repeater> {
        self.groups.iter().flat_map(|g| &g.items).filter_map(|item| match item {
            FormItem::Repeater(repeater) => Some(repeater),
            FormItem::Field(_) => None,
        })
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields().find(|f| f.name == name)
    }

    #[must_use]
    pub fn repeater(&self, name: &str) -> Option<&Repeater> {
        self.repeaters().find(|r| r.name == name)
    }

    #[must_use]
    pub const fn derivations(&self) -> &Derivations {
        &self.derivations
    }

    /// Copy of the schema without one field, for relation forms where the
    /// link to the parent is fixed.
    #[must_use]
    pub fn without_field(&self, name: &str) -> Self {
        let mut schema = self.clone();
        for group in &mut schema.groups {
            group
                .items
                .retain(|item| !matches!(item, FormItem::Field(f) if f.name == name));
        }
        schema.groups.retain(|g| !g.items.is_empty());
        schema
    }

    /// Initial state of the create form.
    #[must_use]
    pub fn defaults(&self, ctx: &DeriveContext<'_>) -> FormState {
        let fields: Vec<FieldDescriptor> = self.fields().cloned().collect();
        let mut state = defaults_for(&fields);
        for repeater in self.repeaters() {
            let rows = (0..repeater.default_items)
                .map(|_| repeater.default_row(ctx))
                .collect();
            state.set(repeater.name, FieldValue::Rows(rows));
        }
        let mut changed: BTreeSet<String> = state
            .iter()
            .filter(|(_, v)| !v.is_blank())
            .map(|(k, _)| k.to_string())
            .collect();
        self.derivations
            .apply(&mut state, &mut changed, ctx, |t| self.is_computed(t));
        state
    }

    /// Coerce raw submitted text into the value shapes fields expect.
    ///
    /// Checkboxes post `0`/`1` (or nothing), multi-selects post nothing
    /// when empty.
    pub fn normalize(&self, state: &mut FormState) {
        for field in self.fields() {
            normalize_field(field, state);
        }
        for repeater in self.repeaters() {
            // An emptied repeater posts only its `name[]` placeholder.
            if let Some(FieldValue::List(_)) = state.get(repeater.name) {
                state.set(repeater.name, FieldValue::Rows(Vec::new()));
            }
            if let Some(FieldValue::Rows(rows)) = state.get(repeater.name).cloned() {
                let rows = rows
                    .into_iter()
                    .map(|mut row| {
                        for field in &repeater.fields {
                            normalize_field(field, &mut row);
                        }
                        row
                    })
                    .collect();
                state.set(repeater.name, FieldValue::Rows(rows));
            }
        }
    }

    /// Merge a submission over `base` and recompute derived fields.
    ///
    /// `base` is the stored record on edit and [`Self::defaults`] on create.
    /// Disabled fields keep their base value whatever the client sent,
    /// except generated create defaults, which keep the value the form
    /// showed (see [`FieldDescriptor::keeps_shown_value`]). The
    /// change events for derivations are reconstructed by comparing the
    /// merged values with `base`. Repeater rows are matched to stored rows
    /// by their hidden id, so an existing line keeps its derived values
    /// unless one of their sources changes.
    #[must_use]
    pub fn submit(&self, base: &FormState, mut submitted: FormState, ctx: &DeriveContext<'_>) -> FormState {
        self.normalize(&mut submitted);
        let mut state = base.clone();
        let mut changed = BTreeSet::new();

        for field in self.fields() {
            merge_field(field, &submitted, &mut state, &mut changed, ctx.operation);
        }

        for repeater in self.repeaters() {
            let Some(FieldValue::Rows(rows)) = submitted.get(repeater.name) else {
                let mut rows = base.rows(repeater.name).to_vec();
                for row in &mut rows {
                    repeater.refresh_row(row, &mut BTreeSet::new(), ctx);
                }
                state.set(repeater.name, FieldValue::Rows(rows));
                continue;
            };
            let stored = base.rows(repeater.name);
            let merged = rows
                .iter()
                .map(|row| {
                    let existing = row
                        .text(ROW_ID)
                        .and_then(|id| stored.iter().find(|s| s.text(ROW_ID) == Some(id)));
                    let mut merged = existing
                        .cloned()
                        .unwrap_or_else(|| defaults_for(&repeater.fields));
                    let mut row_changed = BTreeSet::new();
                    for field in &repeater.fields {
                        merge_field(field, row, &mut merged, &mut row_changed, ctx.operation);
                    }
                    repeater.refresh_row(&mut merged, &mut row_changed, ctx);
                    merged
                })
                .collect::<Vec<_>>();
            if merged.as_slice() != stored {
                changed.insert(repeater.name.to_string());
            }
            state.set(repeater.name, FieldValue::Rows(merged));
        }

        self.derivations
            .apply(&mut state, &mut changed, ctx, |t| self.is_computed(t));
        state
    }

    /// Apply one live field-change event to the state the browser holds.
    ///
    /// `path` is a field name or a repeater path like `items.0.product_id`.
    #[must_use]
    pub fn refresh(&self, mut state: FormState, path: &str, ctx: &DeriveContext<'_>) -> FormState {
        self.normalize(&mut state);
        let mut parts = path.splitn(3, '.');
        let (head, index, row_field) = (parts.next(), parts.next(), parts.next());

        for repeater in self.repeaters() {
            let target = match (head, index, row_field) {
                (Some(name), Some(index), Some(field)) if name == repeater.name => {
                    index.parse::<usize>().ok().map(|i| (i, field))
                }
                _ => None,
            };
            let rows = state.rows_mut(repeater.name);
            for (i, row) in rows.iter_mut().enumerate() {
                let mut changed = BTreeSet::new();
                if let Some((_, field)) = target.filter(|(t, _)| *t == i) {
                    changed.insert(field.to_string());
                }
                repeater.refresh_row(row, &mut changed, ctx);
            }
        }

        let mut changed = BTreeSet::new();
        if let (Some(name), None) = (head, index) {
            changed.insert(name.to_string());
        }
        self.derivations
            .apply(&mut state, &mut changed, ctx, |t| self.is_computed(t));
        state
    }

    /// Add a default row to a repeater.
    pub fn add_row(&self, state: &mut FormState, repeater: &str, ctx: &DeriveContext<'_>) {
        if let Some(repeater) = self.repeater(repeater) {
            let row = repeater.default_row(ctx);
            state.rows_mut(repeater.name).push(row);
        }
    }

    /// Remove a repeater row by position.
    pub fn remove_row(&self, state: &mut FormState, repeater: &str, index: usize) {
        if self.repeater(repeater).is_some() {
            let rows = state.rows_mut(repeater);
            if index < rows.len() {
                rows.remove(index);
            }
        }
    }

    /// Validate a merged state.
    ///
    /// Synchronous rules run first; lookup rules only run for fields that
    /// passed them. `record_id` is the record being edited and is excluded
    /// from uniqueness checks.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a lookup fails.
    pub async fn validate<L: ValidationLookup>(
        &self,
        state: &FormState,
        operation: Operation,
        record_id: Option<i32>,
        lookup: &L,
    ) -> Result<FieldErrors, RepositoryError> {
        let mut errors = FieldErrors::new();

        for field in self.fields() {
            let value = state.get(field.name).unwrap_or(&FieldValue::Null);
            if let Some(message) = check_sync(field, value, operation) {
                errors.add(field.name, message);
                continue;
            }
            if let Some(message) = check_lookup(field, value, record_id, lookup).await? {
                errors.add(field.name, message);
            }
        }

        for repeater in self.repeaters() {
            let rows = state.rows(repeater.name);
            if rows.len() < repeater.min_items {
                errors.add(
                    repeater.name,
                    format!(
                        "The {} field must have at least {} rows.",
                        repeater.label.to_lowercase(),
                        repeater.min_items
                    ),
                );
            }
            for (index, row) in rows.iter().enumerate() {
                for field in &repeater.fields {
                    let value = row.get(field.name).unwrap_or(&FieldValue::Null);
                    let path = row_path(repeater.name, index, field.name);
                    if let Some(message) = check_sync(field, value, operation) {
                        errors.add(path, message);
                        continue;
                    }
                    if let Some(message) = check_lookup(field, value, None, lookup).await? {
                        errors.add(path, message);
                    }
                }
            }
        }

        Ok(errors)
    }

    /// Strip everything that is not persisted.
    #[must_use]
    pub fn dehydrate(&self, state: &FormState) -> FormState {
        let mut out = FormState::new();
        for field in self.fields().filter(|f| f.is_persisted()) {
            out.set(
                field.name,
                state.get(field.name).cloned().unwrap_or_default(),
            );
        }
        for repeater in self.repeaters() {
            let rows = state
                .rows(repeater.name)
                .iter()
                .map(|row| {
                    let mut kept = FormState::new();
                    if let Some(id) = row.get(ROW_ID) {
                        kept.set(ROW_ID, id.clone());
                    }
                    for field in repeater.fields.iter().filter(|f| f.is_persisted()) {
                        kept.set(field.name, row.get(field.name).cloned().unwrap_or_default());
                    }
                    kept
                })
                .collect();
            out.set(repeater.name, FieldValue::Rows(rows));
        }
        out
    }

    /// Product ids read by price derivations in `state`, so the caller can
    /// load just those prices.
    #[must_use]
    pub fn price_references(&self, state: &FormState) -> Vec<i32> {
        let mut ids = Vec::new();
        let mut collect = |derivations: &Derivations, state: &FormState| {
            for derivation in derivations.iter().filter(|d| d.op == DeriveOp::ProductPrice) {
                for source in &derivation.sources {
                    if let Some(id) = state.text(source).and_then(|t| t.parse().ok()) {
                        ids.push(id);
                    }
                }
            }
        };
        collect(&self.derivations, state);
        for repeater in self.repeaters() {
            for row in state.rows(repeater.name) {
                collect(&repeater.derivations, row);
            }
        }
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Map a storage unique-constraint name back to the field it guards.
    #[must_use]
    pub fn field_for_constraint(&self, constraint: &str) -> Option<&FieldDescriptor> {
        self.fields().find(|field| {
            field.rules.iter().any(|rule| match rule {
                Rule::Unique(unique) => unique.constraint_name() == constraint,
                _ => false,
            })
        })
    }

    fn is_computed(&self, name: &str) -> bool {
        self.field(name)
            .is_some_and(|f| matches!(f.kind, FieldKind::Computed))
    }
}

fn is_computed(fields: &[FieldDescriptor], name: &str) -> bool {
    fields
        .iter()
        .any(|f| f.name == name && matches!(f.kind, FieldKind::Computed))
}

fn check_known_fields(
    list: &[Derivation],
    known: impl Fn(&str) -> bool,
) -> Result<(), SchemaError> {
    for derivation in list {
        for name in derivation.sources.iter().chain([&derivation.target]) {
            if !known(name) {
                return Err(SchemaError::UnknownField(*name));
            }
        }
    }
    Ok(())
}

fn defaults_for(fields: &[FieldDescriptor]) -> FormState {
    let mut state = FormState::new();
    for field in fields {
        let value = match &field.default {
            FieldDefault::None => match field.kind {
                FieldKind::Toggle => FieldValue::Bool(false),
                FieldKind::MultiRelation(_) => FieldValue::List(Vec::new()),
                _ => FieldValue::Null,
            },
            FieldDefault::Bool(b) => FieldValue::Bool(*b),
            FieldDefault::Text(text) => FieldValue::text(*text),
            FieldDefault::Today => FieldValue::Text(Utc::now().date_naive().to_string()),
            FieldDefault::Generated(generate) => FieldValue::text(generate()),
        };
        state.set(field.name, value);
    }
    state
}

fn normalize_field(field: &FieldDescriptor, state: &mut FormState) {
    match field.kind {
        FieldKind::Toggle => {
            let on = match state.get(field.name) {
                Some(FieldValue::Bool(b)) => *b,
                Some(FieldValue::Text(t)) => {
                    matches!(t.to_ascii_lowercase().as_str(), "1" | "on" | "true" | "yes")
                }
                _ => false,
            };
            state.set(field.name, FieldValue::Bool(on));
        }
        FieldKind::MultiRelation(_) => match state.get(field.name) {
            Some(FieldValue::List(_)) => {}
            Some(FieldValue::Text(t)) => {
                let item = t.clone();
                state.set(field.name, FieldValue::List(vec![item]));
            }
            _ => state.set(field.name, FieldValue::List(Vec::new())),
        },
        _ => {}
    }
}

fn merge_field(
    field: &FieldDescriptor,
    submitted: &FormState,
    state: &mut FormState,
    changed: &mut BTreeSet<String>,
    operation: Operation,
) {
    let Some(value) = submitted.get(field.name) else {
        return;
    };
    if field.disabled && !(field.keeps_shown_value(operation) && !value.is_blank()) {
        return;
    }
    if state.get(field.name).unwrap_or(&FieldValue::Null) != value {
        changed.insert(field.name.to_string());
    }
    state.set(field.name, value.clone());
}

fn check_sync(field: &FieldDescriptor, value: &FieldValue, operation: Operation) -> Option<String> {
    if matches!(field.kind, FieldKind::Computed) {
        return None;
    }
    if value.is_blank() && field.is_required_for(operation) {
        return Some(format!(
            "The {} field is required.",
            field.label.to_lowercase()
        ));
    }
    field
        .rules
        .iter()
        .find_map(|rule| rule.check(&field.label, &field.kind, value))
}

async fn check_lookup<L: ValidationLookup>(
    field: &FieldDescriptor,
    value: &FieldValue,
    record_id: Option<i32>,
    lookup: &L,
) -> Result<Option<String>, RepositoryError> {
    if value.is_blank() {
        return Ok(None);
    }
    let label = field.label.to_lowercase();
    for rule in field.rules.iter().filter(|r| r.needs_lookup()) {
        match rule {
            Rule::Unique(unique) => {
                if let Some(text) = value.as_text()
                    && lookup.is_taken(*unique, text, record_id).await?
                {
                    return Ok(Some(unique_message(&field.label)));
                }
            }
            Rule::Exists(source) => {
                let ids: Vec<&str> = match value {
                    FieldValue::Text(text) => vec![text.as_str()],
                    FieldValue::List(items) => items.iter().map(String::as_str).collect(),
                    _ => Vec::new(),
                };
                for id in ids {
                    let found = match id.trim().parse::<i32>() {
                        Ok(id) => lookup.exists(*source, id).await?,
                        Err(_) => false,
                    };
                    if !found {
                        return Ok(Some(format!("The selected {label} is invalid.")));
                    }
                }
            }
            Rule::NoCategoryCycle => {
                let (Some(record), Some(parent)) = (
                    record_id,
                    value.as_text().and_then(|t| t.parse::<i32>().ok()),
                ) else {
                    continue;
                };
                if parent == record || lookup.category_ancestors(parent).await?.contains(&record) {
                    return Ok(Some(format!(
                        "The {label} cannot be this category or one of its descendants."
                    )));
                }
            }
            _ => {}
        }
    }
    Ok(None)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::resource::derive::{PriceBook, SlugPolicy};
    use crate::resource::field::{RelationSource, SelectOption};
    use crate::resource::lookup::memory::MemoryLookup;
    use crate::resource::rules::UniqueRule;

    const SLUG: UniqueRule = UniqueRule {
        table: "brands",
        column: "slug",
    };

    fn brand_form() -> FormSchema {
        FormSchema::new(
            LayoutKind::Sections,
            vec![FieldGroup::new(
                "Information",
                vec![
                    FieldDescriptor::text("name", "Name").required(),
                    FieldDescriptor::text("slug", "Slug")
                        .disabled_dehydrated()
                        .required()
                        .unique("brands", "slug"),
                    FieldDescriptor::toggle("is_visible", "Visibility")
                        .default(FieldDefault::Bool(true)),
                ],
            )],
            vec![Derivation::slug("name", "slug")],
        )
        .unwrap()
    }

    fn order_form() -> FormSchema {
        let items = Repeater::new(
            "items",
            "Items",
            vec![
                FieldDescriptor::relation("product_id", "Product", RelationSource::Products)
                    .required(),
                FieldDescriptor::new("quantity", "Quantity", FieldKind::Integer)
                    .required()
                    .rule(Rule::Integer)
                    .rule(Rule::MinValue(1))
                    .default(FieldDefault::Text("1")),
                FieldDescriptor::new("unit_price", "Unit Price", FieldKind::Decimal)
                    .disabled_dehydrated()
                    .required(),
                FieldDescriptor::computed("total", "Total Price"),
            ],
        )
        .with_derivations(vec![
            Derivation::product_price("product_id", "unit_price"),
            Derivation::multiply("quantity", "unit_price", "total"),
        ])
        .unwrap();
        FormSchema::new(
            LayoutKind::Wizard,
            vec![
                FieldGroup::new(
                    "Order Details",
                    vec![FieldDescriptor::select(
                        "status",
                        "Status",
                        vec![SelectOption::new("pending", "Pending")],
                    )],
                ),
                FieldGroup::repeater("Order Items", items),
            ],
            Vec::new(),
        )
        .unwrap()
    }

    fn ctx(operation: Operation, prices: &PriceBook) -> DeriveContext<'_> {
        DeriveContext {
            operation,
            slug_policy: SlugPolicy::Always,
            prices,
        }
    }

    fn submission(pairs: &[(&str, &str)]) -> FormState {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        FormState::from_pairs(&pairs)
    }

    #[test]
    fn test_unknown_derivation_field_is_rejected() {
        let result = FormSchema::new(
            LayoutKind::Sections,
            vec![FieldGroup::new("Info", vec![FieldDescriptor::text("name", "Name")])],
            vec![Derivation::slug("name", "slug")],
        );
        assert_eq!(result.err(), Some(SchemaError::UnknownField("slug")));
    }

    #[test]
    fn test_defaults() {
        let prices = PriceBook::new();
        let state = brand_form().defaults(&ctx(Operation::Create, &prices));
        assert!(state.flag("is_visible"));
        assert_eq!(state.get("name"), Some(&FieldValue::Null));

        let order = order_form().defaults(&ctx(Operation::Create, &prices));
        assert_eq!(order.rows("items").len(), 1);
        assert_eq!(order.rows("items")[0].text("quantity"), Some("1"));
    }

    #[test]
    fn test_submit_ignores_client_slug_and_derives() {
        let prices = PriceBook::new();
        let form = brand_form();
        let c = ctx(Operation::Create, &prices);
        let base = form.defaults(&c);
        let state = form.submit(
            &base,
            submission(&[("name", "Acme Tools"), ("slug", "forged"), ("is_visible", "0")]),
            &c,
        );
        assert_eq!(state.text("slug"), Some("acme-tools"));
        assert!(!state.flag("is_visible"));
    }

    #[test]
    fn test_unchanged_name_keeps_stored_slug() {
        let prices = PriceBook::new();
        let form = brand_form();
        let stored = FormState::new()
            .with("name", FieldValue::text("Acme"))
            .with("slug", FieldValue::text("legacy-acme"))
            .with("is_visible", FieldValue::Bool(true));
        let state = form.submit(
            &stored,
            submission(&[("name", "Acme"), ("is_visible", "1")]),
            &ctx(Operation::Edit, &prices),
        );
        assert_eq!(state.text("slug"), Some("legacy-acme"));
    }

    #[test]
    fn test_existing_line_keeps_unit_price() {
        let prices: PriceBook = [(7, Decimal::new(3000, 2))].into_iter().collect();
        let form = order_form();
        let row = FormState::new()
            .with(ROW_ID, FieldValue::text("11"))
            .with("product_id", FieldValue::text("7"))
            .with("quantity", FieldValue::text("1"))
            .with("unit_price", FieldValue::text("25.00"));
        let stored = FormState::new()
            .with("status", FieldValue::text("pending"))
            .with("items", FieldValue::Rows(vec![row]));

        let state = form.submit(
            &stored,
            submission(&[
                ("status", "pending"),
                ("items[0][id]", "11"),
                ("items[0][product_id]", "7"),
                ("items[0][quantity]", "3"),
                ("items[0][unit_price]", "0.01"),
                ("items[1][product_id]", "7"),
                ("items[1][quantity]", "2"),
            ]),
            &ctx(Operation::Edit, &prices),
        );
        let rows = state.rows("items");
        assert_eq!(rows[0].text("unit_price"), Some("25.00"));
        assert_eq!(rows[0].text("total"), Some("75.00"));
        assert_eq!(rows[1].text("unit_price"), Some("30.00"));
        assert_eq!(rows[1].text("total"), Some("60.00"));
        assert_eq!(rows[1].get(ROW_ID), None);
    }

    #[test]
    fn test_emptied_repeater_clears_stored_rows() {
        let prices = PriceBook::new();
        let form = order_form();
        let row = FormState::new()
            .with(ROW_ID, FieldValue::text("11"))
            .with("product_id", FieldValue::text("7"));
        let stored = FormState::new().with("items", FieldValue::Rows(vec![row]));

        let state = form.submit(
            &stored,
            submission(&[("status", "pending"), ("items[]", "")]),
            &ctx(Operation::Edit, &prices),
        );
        assert!(state.rows("items").is_empty());
    }

    #[test]
    fn test_refresh_row_product_change() {
        let prices: PriceBook = [(4, Decimal::new(1250, 2))].into_iter().collect();
        let form = order_form();
        let state = submission(&[
            ("items[0][product_id]", "4"),
            ("items[0][quantity]", "2"),
            ("items[0][unit_price]", ""),
        ]);
        let state = form.refresh(state, "items.0.product_id", &ctx(Operation::Create, &prices));
        assert_eq!(state.rows("items")[0].text("unit_price"), Some("12.50"));
        assert_eq!(state.rows("items")[0].text("total"), Some("25.00"));
    }

    #[test]
    fn test_add_and_remove_rows() {
        let prices = PriceBook::new();
        let form = order_form();
        let c = ctx(Operation::Create, &prices);
        let mut state = form.defaults(&c);
        form.add_row(&mut state, "items", &c);
        assert_eq!(state.rows("items").len(), 2);
        form.remove_row(&mut state, "items", 0);
        form.remove_row(&mut state, "items", 9);
        assert_eq!(state.rows("items").len(), 1);
    }

    #[tokio::test]
    async fn test_unique_ignores_current_record() {
        let form = brand_form();
        let lookup = MemoryLookup::new().with_value(SLUG, "acme", 1);
        let state = FormState::new()
            .with("name", FieldValue::text("Acme"))
            .with("slug", FieldValue::text("acme"));

        let errors = form
            .validate(&state, Operation::Edit, Some(1), &lookup)
            .await
            .unwrap();
        assert!(errors.is_empty());

        let errors = form
            .validate(&state, Operation::Create, None, &lookup)
            .await
            .unwrap();
        assert_eq!(errors.first("slug"), Some("The slug has already been taken."));
    }

    #[tokio::test]
    async fn test_row_errors_use_paths() {
        let form = order_form();
        let lookup = MemoryLookup::new().with_record(RelationSource::Products, 7);
        let row = FormState::new()
            .with("product_id", FieldValue::text("8"))
            .with("quantity", FieldValue::text("0"))
            .with("unit_price", FieldValue::text("1.00"));
        let state = FormState::new()
            .with("status", FieldValue::text("pending"))
            .with("items", FieldValue::Rows(vec![row]));
        let errors = form
            .validate(&state, Operation::Create, None, &lookup)
            .await
            .unwrap();
        assert_eq!(
            errors.first("items.0.product_id"),
            Some("The selected product is invalid.")
        );
        assert_eq!(
            errors.first("items.0.quantity"),
            Some("The quantity field must be at least 1.")
        );
    }

    #[tokio::test]
    async fn test_category_cycle_is_rejected() {
        let form = FormSchema::new(
            LayoutKind::Sections,
            vec![FieldGroup::new(
                "Status",
                vec![
                    FieldDescriptor::relation("parent_id", "Parent", RelationSource::Categories)
                        .rule(Rule::NoCategoryCycle),
                ],
            )],
            Vec::new(),
        )
        .unwrap();
        // 3 -> 2 -> 1
        let lookup = MemoryLookup::new().with_parent(3, 2).with_parent(2, 1);

        let own = FormState::new().with("parent_id", FieldValue::text("1"));
        let errors = form.validate(&own, Operation::Edit, Some(1), &lookup).await.unwrap();
        assert!(errors.has("parent_id"));

        let descendant = FormState::new().with("parent_id", FieldValue::text("3"));
        let errors = form
            .validate(&descendant, Operation::Edit, Some(1), &lookup)
            .await
            .unwrap();
        assert!(errors.has("parent_id"));

        let fine = FormState::new().with("parent_id", FieldValue::text("1"));
        let errors = form.validate(&fine, Operation::Edit, Some(3), &lookup).await.unwrap();
        assert!(errors.is_empty());
    }

    #[test]
    fn test_dehydrate_drops_computed() {
        let prices = PriceBook::new();
        let form = order_form();
        let state = form.defaults(&ctx(Operation::Create, &prices));
        let out = form.dehydrate(&state);
        let row = &out.rows("items")[0];
        assert!(row.contains("unit_price"));
        assert!(!row.contains("total"));
    }

    #[test]
    fn test_price_references_collects_row_products() {
        let form = order_form();
        let state = submission(&[
            ("items[0][product_id]", "7"),
            ("items[1][product_id]", "3"),
            ("items[2][product_id]", "7"),
            ("items[3][product_id]", ""),
        ]);
        assert_eq!(form.price_references(&state), vec![3, 7]);
    }

    #[test]
    fn test_field_for_constraint() {
        let form = brand_form();
        assert_eq!(
            form.field_for_constraint("brands_slug_key").map(|f| f.name),
            Some("slug")
        );
        assert!(form.field_for_constraint("brands_url_key").is_none());
    }
}
