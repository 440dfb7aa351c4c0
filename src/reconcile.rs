//! Tag set reconciliation
//!
//! [`Reconciler`] moves an entity's attached tag set from its current state
//! to a desired state with the minimal attach/detach operations: tags in
//! both sets are left untouched, never detached and re-attached. The diff is
//! computed once, from one snapshot of the entity's associations; removals
//! run before additions so a half-updated entity never sees transient
//! duplicates.
//!
//! No transaction spans a reconciliation. If the store fails mid-call,
//! already-applied attaches and detaches stay applied; hosts needing
//! all-or-nothing semantics wrap the call in their own transactional scope.

use std::collections::{BTreeMap, BTreeSet};

use crate::TaggableError;
use crate::config::TaggingConfig;
use crate::entity::Taggable;
use crate::resolve::TagResolver;
use crate::slug::slugify_with;
use crate::store::TagStore;
use crate::tag::MatchField;

/// Drives attach/detach operations against taggable entities.
pub struct Reconciler {
    resolver: TagResolver,
}

impl Reconciler {
    /// Reconciler with a fresh resolver over the given configuration.
    #[must_use]
    pub fn new(config: TaggingConfig) -> Self {
        Self {
            resolver: TagResolver::new(config),
        }
    }

    /// Reconciler over a preconfigured resolver (e.g. one carrying hooks).
    #[must_use]
    pub fn with_resolver(resolver: TagResolver) -> Self {
        Self { resolver }
    }

    #[must_use]
    pub fn resolver(&self) -> &TagResolver {
        &self.resolver
    }

    fn config(&self) -> &TaggingConfig {
        self.resolver.config()
    }

    /// Replace the entity's tag set with `desired`, matching by slug.
    ///
    /// # Errors
    ///
    /// Returns an error for a name that normalizes to an empty slug or for
    /// store failures. Operations applied before the failure stay applied.
    pub fn set_tags(
        &self,
        store: &dyn TagStore,
        entity: &mut dyn Taggable,
        desired: &[String],
    ) -> Result<(), TaggableError> {
        self.set_tags_by(store, entity, desired, MatchField::Slug)
    }

    /// Replace the entity's tag set with `desired`, matching by the given
    /// field.
    ///
    /// Current values come from the entity's attached tags projected through
    /// `match_field` in the configured locale; desired values are the given
    /// names, normalized when matching by slug. Tags present on both sides
    /// are untouched.
    ///
    /// # Errors
    ///
    /// See [`set_tags`](Self::set_tags).
    pub fn set_tags_by(
        &self,
        store: &dyn TagStore,
        entity: &mut dyn Taggable,
        desired: &[String],
        match_field: MatchField,
    ) -> Result<(), TaggableError> {
        let current = self.current_values(store, entity, match_field)?;

        // Desired match-values, each keeping the raw name that produced it
        // so additions resolve with the user's spelling intact.
        let mut wanted: BTreeMap<String, &str> = BTreeMap::new();
        for name in desired {
            let value = match match_field {
                MatchField::Slug => slugify_with(name, self.config().separator),
                MatchField::Name => name.clone(),
            };
            wanted.entry(value).or_insert(name.as_str());
        }

        let to_remove: Vec<String> = current
            .iter()
            .filter(|value| !wanted.contains_key(*value))
            .cloned()
            .collect();
        let to_add: Vec<&str> = wanted
            .iter()
            .filter(|(value, _)| !current.contains(*value))
            .map(|(_, name)| *name)
            .collect();

        tracing::debug!(
            namespace = entity.namespace(),
            adds = to_add.len(),
            removes = to_remove.len(),
            unchanged = current.len() - to_remove.len(),
            "reconciling tag set"
        );

        for value in &to_remove {
            self.remove_tag(store, entity, value)?;
        }
        for name in to_add {
            self.add_tag(store, entity, name)?;
        }

        Ok(())
    }

    /// Attach every name, leaving existing tags alone.
    ///
    /// # Errors
    ///
    /// See [`add_tag`](Self::add_tag).
    pub fn tag(
        &self,
        store: &dyn TagStore,
        entity: &mut dyn Taggable,
        names: &[String],
    ) -> Result<(), TaggableError> {
        for name in names {
            self.add_tag(store, entity, name)?;
        }
        Ok(())
    }

    /// Detach the given names, or — with `None` — the entity's entire
    /// currently attached tag set. Matching is by slug either way.
    ///
    /// # Errors
    ///
    /// Returns store failures; names that match no tag are no-ops.
    pub fn untag(
        &self,
        store: &dyn TagStore,
        entity: &mut dyn Taggable,
        names: Option<&[String]>,
    ) -> Result<(), TaggableError> {
        let targets: Vec<String> = match names {
            Some(names) => names.to_vec(),
            None => self
                .current_values(store, entity, MatchField::Slug)?
                .into_iter()
                .collect(),
        };

        for name in &targets {
            self.remove_tag(store, entity, name)?;
        }
        Ok(())
    }

    /// Resolve one name and attach the resulting tag.
    ///
    /// Attaching an already-attached tag is a no-op: neither a second tag
    /// row nor a second association is created.
    ///
    /// # Errors
    ///
    /// Returns [`TaggableError::InvalidTagName`] for a name that normalizes
    /// to an empty slug, or store failures.
    pub fn add_tag(
        &self,
        store: &dyn TagStore,
        entity: &mut dyn Taggable,
        name: &str,
    ) -> Result<(), TaggableError> {
        let locale = self.config().default_locale.clone();
        let tag = self.resolver.resolve(store, entity.namespace(), name, &locale)?;

        if !entity.has_tag(tag.id) {
            entity.attach(tag.id);
            tracing::trace!(namespace = entity.namespace(), id = %tag.id, "attached tag");
        }
        Ok(())
    }

    /// Detach the tag whose normalized slug matches `name`.
    ///
    /// A name matching no tag in the entity's namespace — including one
    /// that normalizes to an empty slug — is a no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns store failures from the lookup.
    pub fn remove_tag(
        &self,
        store: &dyn TagStore,
        entity: &mut dyn Taggable,
        name: &str,
    ) -> Result<(), TaggableError> {
        let slug = slugify_with(name, self.config().separator);
        if slug.is_empty() {
            return Ok(());
        }

        match store.find_by_namespace_and_slug(entity.namespace(), &slug, None)? {
            Some(tag) => {
                entity.detach(tag.id);
                tracing::trace!(namespace = entity.namespace(), id = %tag.id, "detached tag");
            }
            None => {
                tracing::trace!(namespace = entity.namespace(), %slug, "detach target not found");
            }
        }
        Ok(())
    }

    /// One match-value per attached tag, projected in the configured locale.
    fn current_values(
        &self,
        store: &dyn TagStore,
        entity: &dyn Taggable,
        match_field: MatchField,
    ) -> Result<BTreeSet<String>, TaggableError> {
        let locale = &self.config().default_locale;
        let mut values = BTreeSet::new();
        for id in entity.associations().iter() {
            // A dangling association contributes nothing to the diff.
            let Some(tag) = store.get(id)? else { continue };
            if let Some(value) = tag.match_value(match_field, locale) {
                values.insert(value.to_string());
            }
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTagStore;
    use crate::testing::Article;

    fn reconciler() -> Reconciler {
        Reconciler::new(TaggingConfig::default())
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    fn slugs_of(entity: &Article, store: &MemoryTagStore) -> Vec<String> {
        entity
            .tags(store)
            .unwrap()
            .iter()
            .filter_map(|t| t.slug("en").map(ToString::to_string))
            .collect()
    }

    #[test]
    fn test_set_tags_minimal_diff() {
        let store = MemoryTagStore::new();
        let reconciler = reconciler();
        let mut entity = Article::new(1);

        reconciler.set_tags(&store, &mut entity, &names(&["a", "b"])).unwrap();
        let b_id = store
            .find_by_namespace_and_slug("article", "b", None)
            .unwrap()
            .unwrap()
            .id;

        reconciler.set_tags(&store, &mut entity, &names(&["b", "c"])).unwrap();

        assert_eq!(slugs_of(&entity, &store), vec!["b", "c"]);
        // "b" kept its original association slot: untouched, not re-attached.
        assert_eq!(entity.associations().iter().next(), Some(b_id));
        // "a" stays in the store as an orphan.
        assert!(store
            .find_by_namespace_and_slug("article", "a", None)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_set_tags_from_empty_and_to_empty() {
        let store = MemoryTagStore::new();
        let reconciler = reconciler();
        let mut entity = Article::new(1);

        reconciler.set_tags(&store, &mut entity, &names(&["x", "y"])).unwrap();
        assert_eq!(entity.associations().len(), 2);

        reconciler.set_tags(&store, &mut entity, &[]).unwrap();
        assert!(entity.associations().is_empty());
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_set_tags_normalizes_desired_names() {
        let store = MemoryTagStore::new();
        let reconciler = reconciler();
        let mut entity = Article::new(1);

        reconciler.set_tags(&store, &mut entity, &names(&["Rust Programming"])).unwrap();
        // Different spelling, same slug: nothing to do.
        reconciler
            .set_tags(&store, &mut entity, &names(&["rust_programming"]))
            .unwrap();

        assert_eq!(entity.associations().len(), 1);
        assert_eq!(store.count(), 1);
        let tag = store
            .find_by_namespace_and_slug("article", "rust-programming", None)
            .unwrap()
            .unwrap();
        // The original display name survived the second call.
        assert_eq!(tag.name("en"), Some("Rust Programming"));
    }

    #[test]
    fn test_set_tags_by_name_field() {
        let store = MemoryTagStore::new();
        let reconciler = reconciler();
        let mut entity = Article::new(1);

        reconciler.set_tags(&store, &mut entity, &names(&["Rust"])).unwrap();
        // By display name, "Rust" matches; "rust" does not.
        reconciler
            .set_tags_by(&store, &mut entity, &names(&["Rust"]), MatchField::Name)
            .unwrap();
        assert_eq!(entity.associations().len(), 1);
    }

    #[test]
    fn test_add_tag_twice_is_single_association() {
        let store = MemoryTagStore::new();
        let reconciler = reconciler();
        let mut entity = Article::new(1);

        reconciler.add_tag(&store, &mut entity, "Go").unwrap();
        reconciler.add_tag(&store, &mut entity, "Go").unwrap();

        assert_eq!(entity.associations().len(), 1);
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_tag_is_attach_only() {
        let store = MemoryTagStore::new();
        let reconciler = reconciler();
        let mut entity = Article::new(1);

        reconciler.tag(&store, &mut entity, &names(&["a", "b"])).unwrap();
        reconciler.tag(&store, &mut entity, &names(&["c"])).unwrap();

        assert_eq!(entity.associations().len(), 3);
    }

    #[test]
    fn test_remove_missing_tag_is_noop() {
        let store = MemoryTagStore::new();
        let reconciler = reconciler();
        let mut entity = Article::new(1);

        reconciler.add_tag(&store, &mut entity, "a").unwrap();
        reconciler.remove_tag(&store, &mut entity, "never-attached").unwrap();
        reconciler.remove_tag(&store, &mut entity, "   ").unwrap();

        assert_eq!(entity.associations().len(), 1);
    }

    #[test]
    fn test_untag_listed_names() {
        let store = MemoryTagStore::new();
        let reconciler = reconciler();
        let mut entity = Article::new(1);

        reconciler.tag(&store, &mut entity, &names(&["a", "b", "c"])).unwrap();
        reconciler
            .untag(&store, &mut entity, Some(&names(&["a", "c"])))
            .unwrap();

        assert_eq!(slugs_of(&entity, &store), vec!["b"]);
    }

    #[test]
    fn test_untag_everything_leaves_rows_behind() {
        let store = MemoryTagStore::new();
        let reconciler = reconciler();
        let mut entity = Article::new(1);

        reconciler.tag(&store, &mut entity, &names(&["a", "b"])).unwrap();
        reconciler.untag(&store, &mut entity, None).unwrap();

        assert!(entity.associations().is_empty());
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_invalid_name_aborts_addition() {
        let store = MemoryTagStore::new();
        let reconciler = reconciler();
        let mut entity = Article::new(1);

        let err = reconciler.add_tag(&store, &mut entity, "!!!").unwrap_err();
        assert!(matches!(err, TaggableError::InvalidTagName(_)));
        assert!(entity.associations().is_empty());
    }
}
