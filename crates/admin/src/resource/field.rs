//! Field descriptors.
//!
//! A field describes one input on a resource form: what kind of control it
//! renders as, which rules validate it, and whether it is editable and
//! persisted.

use super::derive::Operation;
use super::rules::{Rule, UniqueRule};

/// Record source for relation pickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationSource {
    Brands,
    Categories,
    Customers,
    Products,
}

impl RelationSource {
    /// Table holding the related records.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Brands => "brands",
            Self::Categories => "categories",
            Self::Customers => "customers",
            Self::Products => "products",
        }
    }
}

/// Static option for select fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    #[must_use]
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

/// Kind of control a field renders as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Url,
    Markdown,
    Toggle,
    Color,
    Decimal,
    Integer,
    Date,
    Select(Vec<SelectOption>),
    Relation(RelationSource),
    MultiRelation(RelationSource),
    /// Image upload stored under `directory` with its original file name.
    Image { directory: &'static str },
    /// Presentational value recomputed on every render; never persisted.
    Computed,
}

/// How a field reports changes while the operator edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Live {
    Off,
    OnChange,
    Debounce(u32),
}

/// Value a field starts with on the create form.
#[derive(Debug, Clone)]
pub enum FieldDefault {
    None,
    Bool(bool),
    Text(&'static str),
    Today,
    Generated(fn() -> String),
}

/// One form input.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: String,
    pub kind: FieldKind,
    pub rules: Vec<Rule>,
    /// Read-only for the operator; submitted values are ignored.
    pub disabled: bool,
    /// Part of the persisted payload even when disabled.
    pub dehydrated: bool,
    pub default: FieldDefault,
    pub helper_text: Option<String>,
    pub full_width: bool,
    pub live: Live,
}

impl FieldDescriptor {
    /// Create a field of the given kind.
    #[must_use]
    pub fn new(name: &'static str, label: &str, kind: FieldKind) -> Self {
        Self {
            name,
            label: label.to_string(),
            kind,
            rules: Vec::new(),
            disabled: false,
            dehydrated: true,
            default: FieldDefault::None,
            helper_text: None,
            full_width: false,
            live: Live::Off,
        }
    }

    #[must_use]
    pub fn text(name: &'static str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    #[must_use]
    pub fn markdown(name: &'static str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Markdown).full_width()
    }

    #[must_use]
    pub fn toggle(name: &'static str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Toggle).default(FieldDefault::Bool(false))
    }

    #[must_use]
    pub fn select(name: &'static str, label: &str, options: Vec<SelectOption>) -> Self {
        Self::new(name, label, FieldKind::Select(options)).rule(Rule::InOptions)
    }

    #[must_use]
    pub fn relation(name: &'static str, label: &str, source: RelationSource) -> Self {
        Self::new(name, label, FieldKind::Relation(source)).rule(Rule::Exists(source))
    }

    #[must_use]
    pub fn multi_relation(name: &'static str, label: &str, source: RelationSource) -> Self {
        Self::new(name, label, FieldKind::MultiRelation(source)).rule(Rule::Exists(source))
    }

    #[must_use]
    pub fn computed(name: &'static str, label: &str) -> Self {
        let mut field = Self::new(name, label, FieldKind::Computed);
        field.disabled = true;
        field.dehydrated = false;
        field
    }

    /// Add a validation rule.
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    #[must_use]
    pub fn required(self) -> Self {
        self.rule(Rule::Required)
    }

    #[must_use]
    pub fn required_on_create(self) -> Self {
        self.rule(Rule::RequiredOnCreate)
    }

    /// Unique within `table.column`, ignoring the record being edited.
    #[must_use]
    pub fn unique(self, table: &'static str, column: &'static str) -> Self {
        self.rule(Rule::Unique(UniqueRule { table, column }))
    }

    /// Render read-only but keep the value in the persisted payload.
    #[must_use]
    pub const fn disabled_dehydrated(mut self) -> Self {
        self.disabled = true;
        self.dehydrated = true;
        self
    }

    #[must_use]
    pub fn default(mut self, default: FieldDefault) -> Self {
        self.default = default;
        self
    }

    #[must_use]
    pub fn helper(mut self, text: &str) -> Self {
        self.helper_text = Some(text.to_string());
        self
    }

    #[must_use]
    pub const fn full_width(mut self) -> Self {
        self.full_width = true;
        self
    }

    #[must_use]
    pub const fn live(mut self, live: Live) -> Self {
        self.live = live;
        self
    }

    /// Whether a value must be present for the given operation.
    #[must_use]
    pub fn is_required_for(&self, operation: Operation) -> bool {
        self.rules.iter().any(|r| match r {
            Rule::Required => true,
            Rule::RequiredOnCreate => operation == Operation::Create,
            _ => false,
        })
    }

    /// Whether a disabled field reads back the value the create form
    /// showed. Generated defaults (order numbers) are displayed before the
    /// record exists and must be saved as displayed.
    #[must_use]
    pub fn keeps_shown_value(&self, operation: Operation) -> bool {
        operation == Operation::Create && matches!(self.default, FieldDefault::Generated(_))
    }

    /// Whether the submitted value is persisted.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        !matches!(self.kind, FieldKind::Computed) && (!self.disabled || self.dehydrated)
    }
}
