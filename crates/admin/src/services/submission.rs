//! Form submission pipeline.
//!
//! A submission is merged over its base state (stored record or create
//! defaults), derived fields are recomputed with the current product
//! prices, the result is validated and finally dehydrated and persisted.
//! A unique violation raced past validation comes back as a field error.

use sqlx::PgPool;

use crate::db::{PgLookup, RepositoryError};
use crate::resource::rules::unique_message;
use crate::resource::{
    DeriveContext, FieldErrors, FormSchema, FormState, Operation, Panel, PriceBook, ResourceKind,
};

use super::records::{RecordError, Records};

/// Result of a submission.
#[derive(Debug)]
pub enum Outcome {
    /// Record saved under this id.
    Saved(i32),
    /// Validation failed; re-render the form with these values.
    Invalid { state: FormState, errors: FieldErrors },
}

/// What is being saved.
#[derive(Debug, Clone, Copy)]
pub struct Target<'f> {
    pub kind: ResourceKind,
    /// Schema the values are merged and validated against.
    pub form: &'f FormSchema,
    /// Record being edited; `None` creates.
    pub record_id: Option<i32>,
}

impl Target<'_> {
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self.record_id {
            Some(_) => Operation::Edit,
            None => Operation::Create,
        }
    }
}

/// Runs submissions against the database.
pub struct Submissions<'a> {
    pool: &'a PgPool,
    panel: &'a Panel,
}

impl<'a> Submissions<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, panel: &'a Panel) -> Self {
        Self { pool, panel }
    }

    /// Derivation inputs for `operation` with the given prices.
    #[must_use]
    pub const fn context<'p>(&self, operation: Operation, prices: &'p PriceBook) -> DeriveContext<'p> {
        DeriveContext {
            operation,
            slug_policy: self.panel.slug_policy,
            prices,
        }
    }

    /// State a submission is merged over: the stored record when editing,
    /// the form defaults when creating. `None` when the record is gone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if loading fails.
    pub async fn base(&self, target: Target<'_>) -> Result<Option<FormState>, RepositoryError> {
        match target.record_id {
            Some(id) => Records::new(self.pool).load_state(target.kind, id).await,
            None => {
                let prices = PriceBook::new();
                let ctx = self.context(Operation::Create, &prices);
                Ok(Some(target.form.defaults(&ctx)))
            }
        }
    }

    /// Prices of every product referenced by `states`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn prices(
        &self,
        form: &FormSchema,
        states: &[&FormState],
    ) -> Result<PriceBook, RepositoryError> {
        let mut ids: Vec<i32> = states
            .iter()
            .flat_map(|state| form.price_references(state))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Records::new(self.pool).price_book(&ids).await
    }

    /// Merge, validate and persist a submission.
    ///
    /// `rejected` carries errors found before the merge (refused uploads);
    /// they block saving like validation errors do.
    ///
    /// # Errors
    ///
    /// Returns `RecordError` if storage fails for a reason other than a
    /// unique violation on a form field.
    #[tracing::instrument(
        skip(self, base, submitted, rejected),
        fields(resource = %target.kind, id = ?target.record_id)
    )]
    pub async fn submit(
        &self,
        target: Target<'_>,
        base: &FormState,
        submitted: FormState,
        rejected: FieldErrors,
    ) -> Result<Outcome, RecordError> {
        let operation = target.operation();
        let prices = self.prices(target.form, &[base, &submitted]).await?;
        let ctx = self.context(operation, &prices);

        let state = target.form.submit(base, submitted, &ctx);
        let lookup = PgLookup::new(self.pool);
        let mut errors = target
            .form
            .validate(&state, operation, target.record_id, &lookup)
            .await?;
        errors.extend(rejected);
        if !errors.is_empty() {
            tracing::debug!(count = errors.len(), "Submission failed validation");
            return Ok(Outcome::Invalid { state, errors });
        }

        let payload = target.form.dehydrate(&state);
        let records = Records::new(self.pool);
        let saved = match target.record_id {
            Some(id) => records.update(target.kind, id, &payload).await.map(|()| id),
            None => records.create(target.kind, &payload).await,
        };

        match saved {
            Ok(id) => Ok(Outcome::Saved(id)),
            Err(RecordError::Repository(RepositoryError::Conflict { constraint })) => {
                let Some(field) = target.form.field_for_constraint(&constraint) else {
                    return Err(RepositoryError::Conflict { constraint }.into());
                };
                tracing::warn!(%constraint, field = field.name, "Unique conflict on save");
                let mut errors = FieldErrors::new();
                errors.add(field.name, unique_message(&field.label));
                Ok(Outcome::Invalid { state, errors })
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_target_operation() {
        let form =
            FormSchema::new(crate::resource::LayoutKind::Sections, Vec::new(), Vec::new()).unwrap();
        let create = Target {
            kind: ResourceKind::Brands,
            form: &form,
            record_id: None,
        };
        assert_eq!(create.operation(), Operation::Create);
        let edit = Target {
            record_id: Some(2),
            ..create
        };
        assert_eq!(edit.operation(), Operation::Edit);
    }
}
