//! Create-or-reuse tag resolution
//!
//! [`TagResolver`] turns a raw human name into the single [`Tag`] row that
//! represents it within a namespace: normalize to a slug, look the slug up
//! across every locale of the namespace, and only create a row when nothing
//! matches. Repeated resolution of the same name — within one reconciliation
//! call or across many — always lands on the same row.
//!
//! Two mechanisms close the duplicate window:
//!
//! - a memo cache of already-resolved `(namespace, locale, slug)` triples,
//!   so one reconciliation never persists the same uncommitted name twice;
//! - the store's uniqueness constraint: losing a concurrent create race
//!   surfaces `DuplicateNamespaceSlug`, which is converted into a re-read of
//!   the winning row and never propagated.
//!
//! Caching ids is safe here because this crate never deletes tag rows.

use moka::sync::Cache;

use crate::TaggableError;
use crate::config::TaggingConfig;
use crate::hooks::HookChain;
use crate::slug::slugify_with;
use crate::store::{StoreError, TagStore};
use crate::tag::{Tag, TagDraft, TagId, TagPatch, Translation};

/// Upper bound on memoized slug resolutions.
const MEMO_CAPACITY: u64 = 10_000;

/// Resolves tag names to rows, creating them on first use.
pub struct TagResolver {
    config: TaggingConfig,
    hooks: HookChain,
    memo: Cache<String, u64>,
}

impl TagResolver {
    /// Resolver with no hooks.
    #[must_use]
    pub fn new(config: TaggingConfig) -> Self {
        Self::with_hooks(config, HookChain::new())
    }

    /// Resolver running the given hook chain around persistence.
    #[must_use]
    pub fn with_hooks(config: TaggingConfig, hooks: HookChain) -> Self {
        Self {
            config,
            hooks,
            memo: Cache::new(MEMO_CAPACITY),
        }
    }

    #[must_use]
    pub fn config(&self) -> &TaggingConfig {
        &self.config
    }

    /// Resolve `raw_name` in `namespace` to an existing or new tag.
    ///
    /// An existing tag matches when any of its locales carries the
    /// normalized slug; it is returned unchanged, even if `locale` itself
    /// has no translation yet. A new tag is created with a single
    /// `{locale: {slug, name}}` entry after the `creating` hooks ran.
    ///
    /// # Errors
    ///
    /// Returns [`TaggableError::InvalidTagName`] when `raw_name` normalizes
    /// to an empty slug, or a store error for persistence failures. A lost
    /// create race is not an error; the winning row is returned instead.
    pub fn resolve(
        &self,
        store: &dyn TagStore,
        namespace: &str,
        raw_name: &str,
        locale: &str,
    ) -> Result<Tag, TaggableError> {
        let slug = slugify_with(raw_name, self.config.separator);
        if slug.is_empty() {
            return Err(TaggableError::InvalidTagName(raw_name.to_string()));
        }

        let key = memo_key(namespace, locale, &slug);
        if let Some(id) = self.memo.get(&key)
            && let Some(tag) = store.get(TagId(id))?
        {
            return Ok(tag);
        }

        if let Some(tag) = store.find_by_namespace_and_slug(namespace, &slug, None)? {
            self.memo.insert(key, tag.id.0);
            return Ok(tag);
        }

        let draft = TagDraft::new(namespace, locale, Translation::new(slug.clone(), raw_name));
        let draft = self.hooks.creating(draft);

        let tag = match store.create(draft) {
            Ok(tag) => {
                tracing::debug!(namespace, %slug, id = %tag.id, "created tag");
                self.hooks.created(&tag);
                tag
            }
            Err(StoreError::DuplicateNamespaceSlug { .. }) => {
                // Another writer won the race; their row is the tag.
                tracing::debug!(namespace, %slug, "lost create race, re-reading");
                store
                    .find_by_namespace_and_slug(namespace, &slug, None)?
                    .ok_or_else(|| {
                        StoreError::CorruptIndex(format!(
                            "slug {slug:?} in namespace {namespace:?} is claimed but has no row"
                        ))
                    })?
            }
            Err(err) => return Err(err.into()),
        };

        self.memo.insert(key, tag.id.0);
        Ok(tag)
    }

    /// Add or replace one locale's translation on an existing tag, running
    /// the `updating`/`updated` hooks around the store write.
    ///
    /// # Errors
    ///
    /// Returns [`TaggableError::InvalidTagName`] for a name that normalizes
    /// to an empty slug, `NotFound` for an unknown id, and — unlike
    /// [`resolve`](Self::resolve) — propagates `DuplicateNamespaceSlug`
    /// when the slug already belongs to a different tag: renaming onto a
    /// taken slug is a caller mistake, not a race to absorb.
    pub fn add_translation(
        &self,
        store: &dyn TagStore,
        id: TagId,
        locale: &str,
        raw_name: &str,
    ) -> Result<Tag, TaggableError> {
        let slug = slugify_with(raw_name, self.config.separator);
        if slug.is_empty() {
            return Err(TaggableError::InvalidTagName(raw_name.to_string()));
        }

        let current = store.get(id)?.ok_or(StoreError::NotFound(id))?;
        let patch = TagPatch::translation(locale, Translation::new(slug, raw_name));
        let patch = self.hooks.updating(&current, patch);

        let tag = store.update(id, patch)?;
        tracing::debug!(namespace = %tag.namespace, locale, id = %tag.id, "updated tag translation");
        self.hooks.updated(&tag);
        Ok(tag)
    }
}

fn memo_key(namespace: &str, locale: &str, slug: &str) -> String {
    format!("{namespace}\u{1f}{locale}\u{1f}{slug}")
}
