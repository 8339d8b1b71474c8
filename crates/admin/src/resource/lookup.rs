//! Database-backed validation seam.
//!
//! Form validation needs a few answers from storage (is this slug taken,
//! does this brand exist, what are this category's ancestors). They are
//! asked through [`ValidationLookup`] so the form engine can be tested
//! without a database.

use std::future::Future;

use crate::db::RepositoryError;

use super::field::RelationSource;
use super::rules::UniqueRule;

/// Storage questions asked while validating a form.
pub trait ValidationLookup: Sync {
    /// Whether `value` is already used in `rule.table.rule.column` by a
    /// record other than `ignore`.
    fn is_taken(
        &self,
        rule: UniqueRule,
        value: &str,
        ignore: Option<i32>,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Whether a live (not soft-deleted) record with `id` exists.
    fn exists(
        &self,
        source: RelationSource,
        id: i32,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Ids of the ancestors of category `id`, nearest first.
    fn category_ancestors(
        &self,
        id: i32,
    ) -> impl Future<Output = Result<Vec<i32>, RepositoryError>> + Send;
}

#[cfg(test)]
pub mod memory {
    //! In-memory lookup for engine tests.

    use std::collections::{HashMap, HashSet};

    use super::{RelationSource, RepositoryError, UniqueRule, ValidationLookup};

    #[derive(Debug, Default)]
    pub struct MemoryLookup {
        /// `(table, column)` → `(value, record id)` pairs.
        taken: HashMap<(&'static str, &'static str), Vec<(String, i32)>>,
        records: HashSet<(RelationSource, i32)>,
        parents: HashMap<i32, i32>,
    }

    impl MemoryLookup {
        pub fn new() -> Self {
            Self::default()
        }

        #[must_use]
        pub fn with_value(mut self, rule: UniqueRule, value: &str, id: i32) -> Self {
            self.taken
                .entry((rule.table, rule.column))
                .or_default()
                .push((value.to_string(), id));
            self
        }

        #[must_use]
        pub fn with_record(mut self, source: RelationSource, id: i32) -> Self {
            self.records.insert((source, id));
            self
        }

        #[must_use]
        pub fn with_parent(mut self, child: i32, parent: i32) -> Self {
            self.parents.insert(child, parent);
            self.records.insert((RelationSource::Categories, child));
            self.records.insert((RelationSource::Categories, parent));
            self
        }
    }

    impl ValidationLookup for MemoryLookup {
        async fn is_taken(
            &self,
            rule: UniqueRule,
            value: &str,
            ignore: Option<i32>,
        ) -> Result<bool, RepositoryError> {
            Ok(self
                .taken
                .get(&(rule.table, rule.column))
                .is_some_and(|values| {
                    values
                        .iter()
                        .any(|(v, id)| v == value && Some(*id) != ignore)
                }))
        }

        async fn exists(&self, source: RelationSource, id: i32) -> Result<bool, RepositoryError> {
            Ok(self.records.contains(&(source, id)))
        }

        async fn category_ancestors(&self, id: i32) -> Result<Vec<i32>, RepositoryError> {
            let mut chain = Vec::new();
            let mut current = id;
            while let Some(parent) = self.parents.get(&current) {
                if chain.contains(parent) {
                    break;
                }
                chain.push(*parent);
                current = *parent;
            }
            Ok(chain)
        }
    }
}
