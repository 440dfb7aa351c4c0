//! In-memory tag store
//!
//! Backs the [`TagStore`](super::TagStore) contract with plain maps. Used by
//! the unit tests and by hosts that want tagging semantics without an
//! embedded database. Uniqueness is enforced with the same
//! `DuplicateNamespaceSlug` signal the sled store raises, so resolver
//! behavior is identical across backends.

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::error::StoreError;
use super::{TagStore, reject_empty_slugs};
use crate::tag::{Tag, TagDraft, TagId, TagPatch};

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    tags: BTreeMap<u64, Tag>,
    /// (namespace, slug, locale) -> tag id
    slugs: BTreeMap<(String, String, String), u64>,
}

/// Map-backed tag store
#[derive(Debug, Default)]
pub struct MemoryTagStore {
    inner: Mutex<Inner>,
}

impl MemoryTagStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tag rows across all namespaces.
    #[must_use]
    pub fn count(&self) -> usize {
        self.lock().tags.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means another test panicked mid-write;
        // the map itself is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TagStore for MemoryTagStore {
    fn create(&self, draft: TagDraft) -> Result<Tag, StoreError> {
        reject_empty_slugs(&draft.translations)?;

        let mut inner = self.lock();
        for (locale, translation) in &draft.translations {
            let key = (draft.namespace.clone(), translation.slug.clone(), locale.clone());
            if inner.slugs.contains_key(&key) {
                return Err(StoreError::DuplicateNamespaceSlug {
                    namespace: draft.namespace.clone(),
                    slug: translation.slug.clone(),
                    locale: locale.clone(),
                });
            }
        }

        inner.next_id += 1;
        let now = Utc::now();
        let tag = Tag {
            id: TagId(inner.next_id),
            namespace: draft.namespace,
            translations: draft.translations,
            created_at: now,
            updated_at: now,
        };

        for (locale, translation) in &tag.translations {
            inner.slugs.insert(
                (tag.namespace.clone(), translation.slug.clone(), locale.clone()),
                tag.id.0,
            );
        }
        inner.tags.insert(tag.id.0, tag.clone());
        Ok(tag)
    }

    fn update(&self, id: TagId, patch: TagPatch) -> Result<Tag, StoreError> {
        reject_empty_slugs(&patch.translations)?;

        let mut inner = self.lock();
        let mut tag = inner.tags.get(&id.0).cloned().ok_or(StoreError::NotFound(id))?;

        for (locale, translation) in &patch.translations {
            let key = (tag.namespace.clone(), translation.slug.clone(), locale.clone());
            if let Some(&owner) = inner.slugs.get(&key)
                && owner != id.0
            {
                return Err(StoreError::DuplicateNamespaceSlug {
                    namespace: tag.namespace.clone(),
                    slug: translation.slug.clone(),
                    locale: locale.clone(),
                });
            }
        }

        for (locale, translation) in patch.translations {
            if let Some(old) = tag.translations.get(&locale)
                && old.slug != translation.slug
            {
                inner
                    .slugs
                    .remove(&(tag.namespace.clone(), old.slug.clone(), locale.clone()));
            }
            inner.slugs.insert(
                (tag.namespace.clone(), translation.slug.clone(), locale.clone()),
                id.0,
            );
            tag.translations.insert(locale, translation);
        }

        tag.updated_at = Utc::now();
        inner.tags.insert(id.0, tag.clone());
        Ok(tag)
    }

    fn get(&self, id: TagId) -> Result<Option<Tag>, StoreError> {
        Ok(self.lock().tags.get(&id.0).cloned())
    }

    fn find_by_namespace_and_slug(
        &self,
        namespace: &str,
        slug: &str,
        locale: Option<&str>,
    ) -> Result<Option<Tag>, StoreError> {
        let inner = self.lock();
        let id = match locale {
            Some(locale) => inner
                .slugs
                .get(&(namespace.to_string(), slug.to_string(), locale.to_string()))
                .copied(),
            None => inner
                .slugs
                .range((namespace.to_string(), slug.to_string(), String::new())..)
                .take_while(|((ns, s, _), _)| ns == namespace && s == slug)
                .map(|(_, &id)| id)
                .next(),
        };
        Ok(id.and_then(|id| inner.tags.get(&id).cloned()))
    }

    fn all_for_namespace(&self, namespace: &str) -> Result<Vec<Tag>, StoreError> {
        Ok(self
            .lock()
            .tags
            .values()
            .filter(|t| t.namespace == namespace)
            .cloned()
            .collect())
    }
}
