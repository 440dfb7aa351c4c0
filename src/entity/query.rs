//! Query semantics over taggable entities
//!
//! The two filters differ in one load-bearing way:
//!
//! - [`where_tag`] is conjunctive: an entity qualifies only when **every**
//!   requested value matches one of its attached tags — one existence check
//!   per value, intersected.
//! - [`with_tag`] is disjunctive: an entity qualifies when **any** attached
//!   tag matches the requested list — a single membership check.
//!
//! Values are compared verbatim against the chosen field across all locales
//! of the attached tags; pass slugs when matching by slug. Query execution
//! against a real backend belongs to the host — these filters define the
//! semantics it must preserve.

use std::collections::BTreeSet;

use super::Taggable;
use crate::store::{StoreError, TagStore};
use crate::tag::MatchField;

/// Entities carrying **all** of the requested values (AND).
///
/// # Errors
///
/// Returns a store error if resolving an entity's tags fails.
///
/// # Examples
///
/// ```
/// # use taggable::entity::{AssociationSet, Taggable, where_tag};
/// # use taggable::store::MemoryTagStore;
/// # use taggable::tag::MatchField;
/// # struct Doc(AssociationSet);
/// # impl Taggable for Doc {
/// #     fn namespace(&self) -> &str { "doc" }
/// #     fn associations(&self) -> &AssociationSet { &self.0 }
/// #     fn associations_mut(&mut self) -> &mut AssociationSet { &mut self.0 }
/// # }
/// # let store = MemoryTagStore::new();
/// # let docs: Vec<Doc> = Vec::new();
/// let hits = where_tag(&docs, &store, &["x".into(), "y".into()], MatchField::Slug).unwrap();
/// # assert!(hits.is_empty());
/// ```
pub fn where_tag<'a, T: Taggable>(
    entities: &'a [T],
    store: &dyn TagStore,
    values: &[String],
    field: MatchField,
) -> Result<Vec<&'a T>, StoreError> {
    let mut hits = Vec::new();
    'entities: for entity in entities {
        let attached = attached_values(entity, store, field)?;
        for value in values {
            if !attached.contains(value.as_str()) {
                continue 'entities;
            }
        }
        hits.push(entity);
    }
    Ok(hits)
}

/// Entities carrying **any** of the requested values (OR).
///
/// # Errors
///
/// Returns a store error if resolving an entity's tags fails.
pub fn with_tag<'a, T: Taggable>(
    entities: &'a [T],
    store: &dyn TagStore,
    values: &[String],
    field: MatchField,
) -> Result<Vec<&'a T>, StoreError> {
    let wanted: BTreeSet<&str> = values.iter().map(String::as_str).collect();

    let mut hits = Vec::new();
    for entity in entities {
        let attached = attached_values(entity, store, field)?;
        if attached.iter().any(|value| wanted.contains(value.as_str())) {
            hits.push(entity);
        }
    }
    Ok(hits)
}

/// Every value of `field` across all locales of the entity's attached tags.
fn attached_values(
    entity: &dyn Taggable,
    store: &dyn TagStore,
    field: MatchField,
) -> Result<BTreeSet<String>, StoreError> {
    let mut values = BTreeSet::new();
    for tag in entity.tags(store)? {
        for value in tag.values(field) {
            values.insert(value.to_string());
        }
    }
    Ok(values)
}
