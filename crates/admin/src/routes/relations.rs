//! Relation manager handlers.
//!
//! Related records are created and edited from the parent's edit page.
//! The link field is hidden from the form and set to the parent on save;
//! the submission is then validated against the related resource's full
//! form, as if it had been saved from its own page.

use axum::{
    extract::{Multipart, Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::error::AppError;
use crate::resource::{
    FieldErrors, FormSchema, FormState, Operation, RelationDescriptor, RelationLink,
    ResourceDescriptor,
};
use crate::services::{Outcome, Records, Submissions, Target};
use crate::state::AppState;

use super::multipart::Submitted;
use super::resources::{FormControls, FormPage, record_title, related};

/// A relation manager on one parent record.
struct Scope<'a> {
    parent: &'a ResourceDescriptor,
    parent_id: i32,
    parent_title: String,
    relation: &'a RelationDescriptor,
    related: &'a ResourceDescriptor,
    /// Related form without the link field.
    form: FormSchema,
}

impl<'a> Scope<'a> {
    /// Resolve the parent resource, the relation and the parent record.
    async fn load(
        state: &'a AppState,
        slug: &str,
        parent_id: i32,
        relation: &str,
    ) -> Result<Self, AppError> {
        let parent = super::resource(state, slug)?;
        let relation = parent
            .relation(relation)
            .ok_or_else(|| AppError::NotFound(format!("relation '{relation}'")))?;
        let related = related(state, relation)?;
        let stored = Records::new(state.pool())
            .load_state(parent.kind, parent_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {parent_id}", parent.model_label)))?;
        Ok(Self {
            parent,
            parent_id,
            parent_title: record_title(parent, &stored),
            relation,
            related,
            form: relation.form(related),
        })
    }

    fn parent_edit_url(&self) -> String {
        format!("/{}/{}/edit", self.parent.slug(), self.parent_id)
    }

    fn base_url(&self) -> String {
        format!(
            "/{}/{}/{}",
            self.parent.slug(),
            self.parent_id,
            self.relation.name
        )
    }

    /// Stored state of a related record that belongs to this parent.
    async fn member(&self, state: &AppState, related_id: i32) -> Result<FormState, AppError> {
        Records::new(state.pool())
            .load_state(self.related.kind, related_id)
            .await?
            .filter(|stored| belongs_to(self.relation.link, self.parent_id, stored))
            .ok_or_else(|| {
                AppError::NotFound(format!("{} {related_id}", self.related.model_label))
            })
    }

    fn page(&self, related_id: Option<i32>, heading: String) -> FormPage<'_> {
        let last = match related_id {
            Some(_) => "Edit",
            None => "Create",
        };
        let action_url = match related_id {
            Some(id) => format!("{}/{id}/edit", self.base_url()),
            None => format!("{}/create", self.base_url()),
        };
        FormPage {
            nav: self.parent,
            kind: self.related.kind,
            schema: &self.form,
            heading,
            breadcrumbs: vec![
                (
                    self.parent.plural_label().to_string(),
                    format!("/{}", self.parent.slug()),
                ),
                (self.parent_title.clone(), self.parent_edit_url()),
                (self.relation.title.to_string(), self.parent_edit_url()),
                (last.to_string(), String::new()),
            ],
            action_url,
            cancel_url: self.parent_edit_url(),
            view_url: None,
            delete_url: related_id.map(|id| format!("{}/{id}/delete", self.base_url())),
            controls: FormControls {
                operation: match related_id {
                    Some(_) => Operation::Edit,
                    None => Operation::Create,
                },
                record_id: related_id,
                relation: Some(self.relation.name),
                parent_id: Some(self.parent_id),
                refresh_url: format!("/{}/form/refresh", self.parent.slug()),
            },
        }
    }

    fn create_heading(&self) -> String {
        format!("Create {}", self.related.model_label)
    }
}

/// Whether a stored related record links to `parent_id`.
fn belongs_to(link: RelationLink, parent_id: i32, stored: &FormState) -> bool {
    let parent = parent_id.to_string();
    match link {
        RelationLink::ForeignKey { field } => stored.text(field) == Some(parent.as_str()),
        RelationLink::Pivot { field, .. } => stored.list(field).contains(&parent),
    }
}

/// Create form for a related record.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    Path((slug, id, relation)): Path<(String, i32, String)>,
) -> Result<Html<String>, AppError> {
    let scope = Scope::load(&state, &slug, id, &relation).await?;
    let submissions = Submissions::new(state.pool(), state.panel());
    let defaults = submissions
        .base(Target {
            kind: scope.related.kind,
            form: &scope.form,
            record_id: None,
        })
        .await?
        .unwrap_or_default();
    scope
        .page(None, scope.create_heading())
        .render(&state, &defaults, &FieldErrors::new(), Vec::new(), None)
        .await
}

/// Submit a related create form.
#[instrument(skip(state, multipart))]
pub async fn store(
    State(state): State<AppState>,
    Path((slug, id, relation)): Path<(String, i32, String)>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let scope = Scope::load(&state, &slug, id, &relation).await?;
    let mut body = Submitted::read(multipart).await?;
    let rejected = body.store_uploads(&scope.form, state.storage()).await?;

    let submissions = Submissions::new(state.pool(), state.panel());
    let target = Target {
        kind: scope.related.kind,
        form: &scope.related.form,
        record_id: None,
    };
    let base = submissions.base(target).await?.unwrap_or_default();
    let mut submitted = body.state();
    scope.relation.link_to(id, &base, &mut submitted);

    match submissions.submit(target, &base, submitted, rejected).await? {
        Outcome::Saved(related_id) => {
            tracing::info!(
                parent = %scope.parent.kind,
                parent_id = id,
                related_id,
                "Related record created"
            );
            Ok(Redirect::to(&format!("{}?notice=created", scope.parent_edit_url())).into_response())
        }
        Outcome::Invalid { state: values, errors } => {
            let page = scope
                .page(None, scope.create_heading())
                .render(&state, &values, &errors, Vec::new(), None)
                .await?;
            Ok(super::resources::unprocessable(page))
        }
    }
}

/// Edit form for a related record.
#[instrument(skip(state))]
pub async fn edit(
    State(state): State<AppState>,
    Path((slug, id, relation, related_id)): Path<(String, i32, String, i32)>,
) -> Result<Html<String>, AppError> {
    let scope = Scope::load(&state, &slug, id, &relation).await?;
    let stored = scope.member(&state, related_id).await?;
    let heading = format!("Edit {}", record_title(scope.related, &stored));
    scope
        .page(Some(related_id), heading)
        .render(&state, &stored, &FieldErrors::new(), Vec::new(), None)
        .await
}

/// Submit a related edit form.
#[instrument(skip(state, multipart))]
pub async fn update(
    State(state): State<AppState>,
    Path((slug, id, relation, related_id)): Path<(String, i32, String, i32)>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let scope = Scope::load(&state, &slug, id, &relation).await?;
    let stored = scope.member(&state, related_id).await?;
    let mut body = Submitted::read(multipart).await?;
    let rejected = body.store_uploads(&scope.form, state.storage()).await?;

    let submissions = Submissions::new(state.pool(), state.panel());
    let target = Target {
        kind: scope.related.kind,
        form: &scope.related.form,
        record_id: Some(related_id),
    };
    let mut submitted = body.state();
    scope.relation.link_to(id, &stored, &mut submitted);

    match submissions.submit(target, &stored, submitted, rejected).await? {
        Outcome::Saved(_) => {
            Ok(Redirect::to(&format!("{}?notice=saved", scope.parent_edit_url())).into_response())
        }
        Outcome::Invalid { state: values, errors } => {
            let heading = format!("Edit {}", record_title(scope.related, &stored));
            let page = scope
                .page(Some(related_id), heading)
                .render(&state, &values, &errors, Vec::new(), None)
                .await?;
            Ok(super::resources::unprocessable(page))
        }
    }
}

/// Soft delete a related record.
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    Path((slug, id, relation, related_id)): Path<(String, i32, String, i32)>,
) -> Result<Redirect, AppError> {
    let scope = Scope::load(&state, &slug, id, &relation).await?;
    scope.member(&state, related_id).await?;
    Records::new(state.pool())
        .delete(scope.related.kind, &[related_id])
        .await?;
    Ok(Redirect::to(&format!(
        "{}?notice=deleted",
        scope.parent_edit_url()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::FieldValue;

    #[test]
    fn test_belongs_to_foreign_key() {
        let link = RelationLink::ForeignKey { field: "brand_id" };
        let stored = FormState::new().with("brand_id", FieldValue::text("3"));
        assert!(belongs_to(link, 3, &stored));
        assert!(!belongs_to(link, 4, &stored));
        assert!(!belongs_to(link, 3, &FormState::new()));
    }

    #[test]
    fn test_belongs_to_pivot() {
        let link = RelationLink::Pivot {
            table: "category_product",
            parent_column: "category_id",
            field: "categories",
        };
        let stored = FormState::new().with(
            "categories",
            FieldValue::List(vec!["1".to_string(), "7".to_string()]),
        );
        assert!(belongs_to(link, 7, &stored));
        assert!(!belongs_to(link, 2, &stored));
    }
}
