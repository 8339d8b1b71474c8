//! Resource page handlers.
//!
//! One set of handlers serves every registered resource; the resource is
//! resolved from the first path segment and its descriptor drives the
//! table, the form and the relation managers.

use std::borrow::Cow;

use askama::Template;
use axum::{
    Form,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::components::data_table::BulkKind;
use crate::error::AppError;
use crate::filters;
use crate::resource::{
    FieldErrors, FormSchema, FormState, Operation, RelationDescriptor, RelationSource,
    ResourceDescriptor, ResourceKind,
};
use crate::services::{Outcome, Records, Submissions, Target, product_scope};
use crate::state::AppState;

use super::export;
use super::multipart::Submitted;
use super::params::ListParams;
use super::views::{self, FormInputs, FormView, RelationOptions, TableLinks, TableView};
use super::{Shell, render};

type QueryPairs = Query<Vec<(String, String)>>;

// =============================================================================
// Templates
// =============================================================================

/// Resource index page.
#[derive(Template)]
#[template(path = "resource/index.html")]
pub struct IndexTemplate {
    pub shell: Shell,
    pub heading: String,
    pub create_url: String,
    pub create_label: String,
    pub table: TableView,
}

/// Hidden controls a form posts back so a refresh can rebuild its schema.
#[derive(Debug, Clone)]
pub struct FormControls {
    pub operation: Operation,
    pub record_id: Option<i32>,
    pub relation: Option<&'static str>,
    pub parent_id: Option<i32>,
    pub refresh_url: String,
}

/// A relation table on an edit page.
#[derive(Debug, Clone)]
pub struct RelationManagerView {
    pub title: String,
    pub create_url: String,
    pub create_label: String,
    pub table: TableView,
}

/// Create and edit page.
#[derive(Template)]
#[template(path = "resource/form.html")]
pub struct FormPageTemplate {
    pub shell: Shell,
    pub heading: String,
    pub breadcrumbs: Vec<(String, String)>,
    pub action_url: String,
    pub cancel_url: String,
    pub view_url: Option<String>,
    pub delete_url: Option<String>,
    pub submit_label: &'static str,
    pub error_count: usize,
    pub controls: FormControls,
    pub form: FormView,
    pub managers: Vec<RelationManagerView>,
}

/// Form body returned by a refresh.
#[derive(Template)]
#[template(path = "resource/form_body.html")]
pub struct FormBodyTemplate {
    pub controls: FormControls,
    pub form: FormView,
}

/// Read-only record page.
#[derive(Template)]
#[template(path = "resource/view.html")]
pub struct ViewTemplate {
    pub shell: Shell,
    pub heading: String,
    pub breadcrumbs: Vec<(String, String)>,
    pub edit_url: String,
    pub form: FormView,
}

// =============================================================================
// Shared page building
// =============================================================================

/// Everything that differs between the form pages.
pub(super) struct FormPage<'a> {
    /// Resource whose navigation entry is active.
    pub nav: &'a ResourceDescriptor,
    /// Kind of the record being edited.
    pub kind: ResourceKind,
    pub schema: &'a FormSchema,
    pub heading: String,
    pub breadcrumbs: Vec<(String, String)>,
    pub action_url: String,
    pub cancel_url: String,
    pub view_url: Option<String>,
    pub delete_url: Option<String>,
    pub controls: FormControls,
}

impl FormPage<'_> {
    /// Build the page for `state` with `errors`.
    pub(super) async fn render(
        self,
        app: &AppState,
        state: &FormState,
        errors: &FieldErrors,
        managers: Vec<RelationManagerView>,
        notice: Option<&str>,
    ) -> Result<Html<String>, AppError> {
        let options = load_options(app, self.schema, self.kind, self.controls.record_id).await?;
        let form = FormView::build(&FormInputs {
            schema: self.schema,
            state,
            errors,
            options: &options,
            readonly: false,
        });
        let shell = Shell::load(app, self.nav.slug(), self.heading.clone())
            .await?
            .with_notice(notice);
        render(&FormPageTemplate {
            shell,
            heading: self.heading,
            breadcrumbs: self.breadcrumbs,
            action_url: self.action_url,
            cancel_url: self.cancel_url,
            view_url: self.view_url,
            delete_url: self.delete_url,
            submit_label: match self.controls.operation {
                Operation::Create => "Create",
                Operation::Edit => "Save changes",
            },
            error_count: errors.len(),
            controls: self.controls,
            form,
            managers,
        })
    }
}

/// Choices for every relation picker in `schema`. A category's own id is
/// left out of its parent picker.
pub(super) async fn load_options(
    state: &AppState,
    schema: &FormSchema,
    kind: ResourceKind,
    record_id: Option<i32>,
) -> Result<RelationOptions, AppError> {
    let records = Records::new(state.pool());
    let mut options = RelationOptions::new();
    for source in views::relation_sources(schema) {
        let exclude = match (kind, source) {
            (ResourceKind::Categories, RelationSource::Categories) => record_id,
            _ => None,
        };
        options.insert(source, records.options(source, exclude).await?);
    }
    Ok(options)
}

/// The related resource of a relation manager.
pub(super) fn related<'a>(
    state: &'a AppState,
    relation: &RelationDescriptor,
) -> Result<&'a ResourceDescriptor, AppError> {
    state
        .panel()
        .get(relation.related)
        .ok_or_else(|| AppError::Internal(format!("resource {} is not registered", relation.related)))
}

/// Title of a record, falling back to its model label.
pub(super) fn record_title(resource: &ResourceDescriptor, state: &FormState) -> String {
    state
        .text(resource.title_field)
        .map_or_else(|| resource.model_label.to_string(), ToString::to_string)
}

fn notice(query: &[(String, String)]) -> Option<&str> {
    query
        .iter()
        .find(|(k, _)| k == "notice")
        .map(|(_, v)| v.as_str())
}

fn create_page<'a>(resource: &'a ResourceDescriptor) -> FormPage<'a> {
    let slug = resource.slug();
    FormPage {
        nav: resource,
        kind: resource.kind,
        schema: &resource.form,
        heading: format!("Create {}", resource.model_label),
        breadcrumbs: vec![
            (resource.plural_label().to_string(), format!("/{slug}")),
            ("Create".to_string(), String::new()),
        ],
        action_url: format!("/{slug}/create"),
        cancel_url: format!("/{slug}"),
        view_url: None,
        delete_url: None,
        controls: FormControls {
            operation: Operation::Create,
            record_id: None,
            relation: None,
            parent_id: None,
            refresh_url: format!("/{slug}/form/refresh"),
        },
    }
}

fn edit_page<'a>(resource: &'a ResourceDescriptor, id: i32, title: String) -> FormPage<'a> {
    let slug = resource.slug();
    FormPage {
        nav: resource,
        kind: resource.kind,
        schema: &resource.form,
        heading: format!("Edit {title}"),
        breadcrumbs: vec![
            (resource.plural_label().to_string(), format!("/{slug}")),
            (title, format!("/{slug}/{id}")),
            ("Edit".to_string(), String::new()),
        ],
        action_url: format!("/{slug}/{id}/edit"),
        cancel_url: format!("/{slug}"),
        view_url: Some(format!("/{slug}/{id}")),
        delete_url: Some(format!("/{slug}/{id}/delete")),
        controls: FormControls {
            operation: Operation::Edit,
            record_id: Some(id),
            relation: None,
            parent_id: None,
            refresh_url: format!("/{slug}/form/refresh"),
        },
    }
}

/// Relation tables for a parent's edit page.
async fn relation_managers(
    state: &AppState,
    resource: &ResourceDescriptor,
    id: i32,
    query: &[(String, String)],
) -> Result<Vec<RelationManagerView>, AppError> {
    let records = Records::new(state.pool());
    let page_url = format!("/{}/{id}/edit", resource.slug());
    let mut managers = Vec::with_capacity(resource.relations.len());
    for relation in &resource.relations {
        let related = related(state, relation)?;
        let params = ListParams::parse(query, &format!("{}_", relation.name));
        let list_query = params.to_query(&related.table, state.config().page_size);
        let page = records
            .list(related, &list_query, product_scope(resource.kind, id))
            .await?;
        let record_base = format!("/{}/{id}/{}", resource.slug(), relation.name);
        let mut table = TableView::build(
            &related.table,
            &page,
            &params,
            &TableLinks {
                page_url: &page_url,
                record_base: &record_base,
                bulk_url: None,
            },
        );
        table.table_id = format!("{}-{}", resource.slug(), relation.name);
        table.bulk_actions.clear();
        for row in &mut table.rows {
            row.view_url = None;
        }
        managers.push(RelationManagerView {
            title: relation.title.to_string(),
            create_url: format!("{record_base}/create"),
            create_label: format!("New {}", related.model_label.to_lowercase()),
            table,
        });
    }
    Ok(managers)
}

pub(super) fn unprocessable(page: Html<String>) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, page).into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Index table.
#[instrument(skip(state, query))]
pub async fn index(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): QueryPairs,
) -> Result<Html<String>, AppError> {
    let resource = super::resource(&state, &slug)?;
    let params = ListParams::parse(&query, "");
    let list_query = params.to_query(&resource.table, state.config().page_size);
    let page = Records::new(state.pool())
        .list(resource, &list_query, None)
        .await?;

    let base = format!("/{}", resource.slug());
    let table = TableView::build(
        &resource.table,
        &page,
        &params,
        &TableLinks {
            page_url: &base,
            record_base: &base,
            bulk_url: resource
                .table
                .has_bulk_actions()
                .then(|| format!("{base}/bulk")),
        },
    );
    let shell = Shell::load(&state, resource.slug(), resource.plural_label())
        .await?
        .with_notice(notice(&query));
    render(&IndexTemplate {
        shell,
        heading: resource.plural_label().to_string(),
        create_url: format!("{base}/create"),
        create_label: format!("New {}", resource.model_label.to_lowercase()),
        table,
    })
}

/// Create form with defaults filled in.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Html<String>, AppError> {
    let resource = super::resource(&state, &slug)?;
    let submissions = Submissions::new(state.pool(), state.panel());
    let target = Target {
        kind: resource.kind,
        form: &resource.form,
        record_id: None,
    };
    let defaults = submissions.base(target).await?.unwrap_or_default();
    create_page(resource)
        .render(&state, &defaults, &FieldErrors::new(), Vec::new(), None)
        .await
}

/// Submit a create form.
#[instrument(skip(state, multipart))]
pub async fn store(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let resource = super::resource(&state, &slug)?;
    let mut body = Submitted::read(multipart).await?;
    let rejected = body.store_uploads(&resource.form, state.storage()).await?;

    let submissions = Submissions::new(state.pool(), state.panel());
    let target = Target {
        kind: resource.kind,
        form: &resource.form,
        record_id: None,
    };
    let base = submissions.base(target).await?.unwrap_or_default();
    match submissions.submit(target, &base, body.state(), rejected).await? {
        Outcome::Saved(id) => {
            Ok(Redirect::to(&format!("/{}/{id}/edit?notice=created", resource.slug())).into_response())
        }
        Outcome::Invalid { state: values, errors } => {
            let page = create_page(resource)
                .render(&state, &values, &errors, Vec::new(), None)
                .await?;
            Ok(unprocessable(page))
        }
    }
}

/// Read-only record view.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, i32)>,
) -> Result<Html<String>, AppError> {
    let resource = super::resource(&state, &slug)?;
    let values = Records::new(state.pool())
        .load_state(resource.kind, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {id}", resource.model_label)))?;

    let options = load_options(&state, &resource.form, resource.kind, Some(id)).await?;
    let form = FormView::build(&FormInputs {
        schema: &resource.form,
        state: &values,
        errors: &FieldErrors::new(),
        options: &options,
        readonly: true,
    });
    let title = record_title(resource, &values);
    let shell = Shell::load(&state, resource.slug(), format!("View {title}")).await?;
    render(&ViewTemplate {
        shell,
        heading: format!("View {title}"),
        breadcrumbs: vec![
            (
                resource.plural_label().to_string(),
                format!("/{}", resource.slug()),
            ),
            (title, String::new()),
        ],
        edit_url: format!("/{}/{id}/edit", resource.slug()),
        form,
    })
}

/// Edit form with relation managers.
#[instrument(skip(state, query))]
pub async fn edit(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, i32)>,
    Query(query): QueryPairs,
) -> Result<Html<String>, AppError> {
    let resource = super::resource(&state, &slug)?;
    let values = Records::new(state.pool())
        .load_state(resource.kind, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {id}", resource.model_label)))?;
    let managers = relation_managers(&state, resource, id, &query).await?;
    edit_page(resource, id, record_title(resource, &values))
        .render(&state, &values, &FieldErrors::new(), managers, notice(&query))
        .await
}

/// Submit an edit form.
#[instrument(skip(state, multipart))]
pub async fn update(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, i32)>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let resource = super::resource(&state, &slug)?;
    let mut body = Submitted::read(multipart).await?;
    let rejected = body.store_uploads(&resource.form, state.storage()).await?;

    let submissions = Submissions::new(state.pool(), state.panel());
    let target = Target {
        kind: resource.kind,
        form: &resource.form,
        record_id: Some(id),
    };
    let base = submissions
        .base(target)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {id}", resource.model_label)))?;
    let title = record_title(resource, &base);
    match submissions.submit(target, &base, body.state(), rejected).await? {
        Outcome::Saved(id) => {
            Ok(Redirect::to(&format!("/{}/{id}/edit?notice=saved", resource.slug())).into_response())
        }
        Outcome::Invalid { state: values, errors } => {
            let managers = relation_managers(&state, resource, id, &[]).await?;
            let page = edit_page(resource, id, title)
                .render(&state, &values, &errors, managers, None)
                .await?;
            Ok(unprocessable(page))
        }
    }
}

/// Soft delete one record.
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, i32)>,
) -> Result<Redirect, AppError> {
    let resource = super::resource(&state, &slug)?;
    let deleted = Records::new(state.pool()).delete(resource.kind, &[id]).await?;
    if deleted == 0 {
        return Err(AppError::NotFound(format!("{} {id}", resource.model_label)));
    }
    Ok(Redirect::to(&format!("/{}?notice=deleted", resource.slug())))
}

/// Run a bulk action on the checked rows.
#[instrument(skip(state, form))]
pub async fn bulk(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Form(form): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let resource = super::resource(&state, &slug)?;
    let key = form
        .iter()
        .find(|(k, _)| k == "action")
        .map(|(_, v)| v.as_str())
        .ok_or_else(|| AppError::BadRequest("missing bulk action".to_string()))?;
    let action = resource
        .table
        .find_bulk_action(key)
        .ok_or_else(|| AppError::BadRequest(format!("unknown bulk action: {key}")))?;
    let ids: Vec<i32> = form
        .iter()
        .filter(|(k, _)| k == "ids")
        .filter_map(|(_, v)| v.parse().ok())
        .collect();

    let index = format!("/{}", resource.slug());
    if ids.is_empty() {
        return Ok(Redirect::to(&index).into_response());
    }
    match action.kind {
        BulkKind::Delete => {
            Records::new(state.pool()).delete(resource.kind, &ids).await?;
            Ok(Redirect::to(&format!("{index}?notice=deleted")).into_response())
        }
        BulkKind::ExportCsv => match resource.kind {
            ResourceKind::Orders => export::orders_csv(&state, &ids).await,
            other => Err(AppError::BadRequest(format!("{other} cannot be exported"))),
        },
    }
}

/// Recompute a form after a live field change or a repeater row action
/// and return the re-rendered form body.
///
/// Besides the field values the body carries `_operation`, `_record`,
/// `_relation` and `_parent` to rebuild the schema, `_changed` with the
/// path of the changed field, and `_action` for `add:{repeater}` or
/// `remove:{repeater}:{index}`.
#[instrument(skip(state, multipart))]
pub async fn refresh(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let resource = super::resource(&state, &slug)?;
    let body = Submitted::read(multipart).await?;
    let operation = body
        .control("_operation")
        .map(str::parse::<Operation>)
        .transpose()
        .map_err(AppError::BadRequest)?
        .unwrap_or(Operation::Create);
    let record_id = parse_control(&body, "_record")?;
    let parent_id = parse_control(&body, "_parent")?;

    let (schema, kind, relation) = match body.control("_relation") {
        Some(name) => {
            let relation = resource
                .relation(name)
                .ok_or_else(|| AppError::NotFound(format!("relation '{name}'")))?;
            let related = related(&state, relation)?;
            (
                Cow::Owned(relation.form(related)),
                related.kind,
                Some(relation.name),
            )
        }
        None => (Cow::Borrowed(&resource.form), resource.kind, None),
    };

    let mut values = body.state();
    let submissions = Submissions::new(state.pool(), state.panel());
    let prices = submissions.prices(&schema, &[&values]).await?;
    let ctx = submissions.context(operation, &prices);

    schema.normalize(&mut values);
    if let Some(action) = body.control("_action") {
        apply_row_action(&schema, &mut values, action, &ctx)?;
    }
    if let Some(path) = body.control("_changed") {
        values = schema.refresh(values, path, &ctx);
    }

    let options = load_options(&state, &schema, kind, record_id).await?;
    let form = FormView::build(&FormInputs {
        schema: &schema,
        state: &values,
        errors: &FieldErrors::new(),
        options: &options,
        readonly: false,
    });
    render(&FormBodyTemplate {
        controls: FormControls {
            operation,
            record_id,
            relation,
            parent_id,
            refresh_url: format!("/{}/form/refresh", resource.slug()),
        },
        form,
    })
}

fn parse_control(body: &Submitted, key: &str) -> Result<Option<i32>, AppError> {
    body.control(key)
        .map(|raw| {
            raw.parse()
                .map_err(|_| AppError::BadRequest(format!("invalid {key}: {raw}")))
        })
        .transpose()
}

fn apply_row_action(
    schema: &FormSchema,
    values: &mut FormState,
    action: &str,
    ctx: &crate::resource::DeriveContext<'_>,
) -> Result<(), AppError> {
    let bad = || AppError::BadRequest(format!("invalid row action: {action}"));
    match action.split(':').collect::<Vec<_>>().as_slice() {
        ["add", repeater] if schema.repeater(repeater).is_some() => {
            schema.add_row(values, repeater, ctx);
            Ok(())
        }
        ["remove", repeater, index] if schema.repeater(repeater).is_some() => {
            let index = index.parse().map_err(|_| bad())?;
            schema.remove_row(values, repeater, index);
            Ok(())
        }
        _ => Err(bad()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::resource::{PriceBook, SlugPolicy};
    use crate::resources;

    fn ctx(prices: &PriceBook) -> crate::resource::DeriveContext<'_> {
        crate::resource::DeriveContext {
            operation: Operation::Create,
            slug_policy: SlugPolicy::Always,
            prices,
        }
    }

    #[test]
    fn test_apply_row_action_adds_and_removes_rows() {
        let panel = resources::panel(SlugPolicy::Always).unwrap();
        let orders = panel.get(ResourceKind::Orders).unwrap();
        let prices = PriceBook::new();
        let mut values = FormState::new();

        apply_row_action(&orders.form, &mut values, "add:items", &ctx(&prices)).unwrap();
        apply_row_action(&orders.form, &mut values, "add:items", &ctx(&prices)).unwrap();
        assert_eq!(values.rows("items").len(), 2);

        apply_row_action(&orders.form, &mut values, "remove:items:0", &ctx(&prices)).unwrap();
        assert_eq!(values.rows("items").len(), 1);
    }

    #[test]
    fn test_apply_row_action_rejects_unknown_repeater() {
        let panel = resources::panel(SlugPolicy::Always).unwrap();
        let orders = panel.get(ResourceKind::Orders).unwrap();
        let prices = PriceBook::new();
        let mut values = FormState::new();

        for action in ["add:lines", "remove:items:x", "drop:items"] {
            assert!(matches!(
                apply_row_action(&orders.form, &mut values, action, &ctx(&prices)),
                Err(AppError::BadRequest(_))
            ));
        }
    }

    #[test]
    fn test_record_title_falls_back_to_label() {
        let panel = resources::panel(SlugPolicy::Always).unwrap();
        let brands = panel.get(ResourceKind::Brands).unwrap();
        let named = FormState::new().with("name", crate::resource::FieldValue::text("Acme"));
        assert_eq!(record_title(brands, &named), "Acme");
        assert_eq!(record_title(brands, &FormState::new()), "Brand");
    }

    #[test]
    fn test_order_form_body_renders_wizard_steps() {
        let panel = resources::panel(SlugPolicy::Always).unwrap();
        let orders = panel.get(ResourceKind::Orders).unwrap();
        let prices = PriceBook::new();
        let state = orders.form.defaults(&ctx(&prices));
        let number = state.text("number").unwrap().to_string();
        let form = FormView::build(&FormInputs {
            schema: &orders.form,
            state: &state,
            errors: &FieldErrors::new(),
            options: &RelationOptions::new(),
            readonly: false,
        });

        let html = render(&FormBodyTemplate {
            controls: FormControls {
                operation: Operation::Create,
                record_id: None,
                relation: None,
                parent_id: None,
                refresh_url: "/orders/form/refresh".to_string(),
            },
            form,
        })
        .unwrap()
        .0;
        assert!(html.contains(r#"data-step="1""#));
        assert!(html.contains(r#"data-step="2""#));
        assert!(html.contains("2. Order Items"));
        assert!(html.contains(&format!(r#"name="number" value="{number}""#)));
    }
}
