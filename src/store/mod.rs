//! Tag persistence
//!
//! Defines the [`TagStore`] collaborator interface the resolver and
//! reconciler work against, plus two implementations:
//!
//! - [`SledTagStore`]: embedded sled database with two trees — `tags`
//!   (id → record) and `slugs`, a reverse index enforcing that a
//!   (namespace, locale, slug) triple maps to at most one tag row.
//! - [`MemoryTagStore`]: the same contract over in-memory maps, for tests
//!   and hosts that do not need persistence.
//!
//! The uniqueness constraint is what closes the create race: concurrent
//! writers racing on the same slug collapse onto one row because the loser's
//! insert surfaces [`StoreError::DuplicateNamespaceSlug`], which the resolver
//! converts into a re-read.

use chrono::Utc;
use sled::{Db, Tree};
use std::collections::BTreeMap;
use std::path::Path;

use crate::tag::{Tag, TagDraft, TagId, TagPatch, Translation};

pub mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryTagStore;

/// Persistence collaborator for tag rows.
///
/// All operations are synchronous blocking calls; no transaction spans more
/// than one method. Implementations must enforce (namespace, locale, slug)
/// uniqueness and surface violations as
/// [`StoreError::DuplicateNamespaceSlug`].
pub trait TagStore {
    /// Persist a new tag and assign its identity.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateNamespaceSlug` if any translation's slug is already
    /// claimed in its locale, `InvalidRecord` for an empty slug, or a
    /// persistence error.
    fn create(&self, draft: TagDraft) -> Result<Tag, StoreError>;

    /// Merge translation entries into an existing tag.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id has no row, `DuplicateNamespaceSlug` if a
    /// patched slug is claimed by a different tag, or a persistence error.
    fn update(&self, id: TagId, patch: TagPatch) -> Result<Tag, StoreError>;

    /// Fetch a tag by id.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the lookup fails.
    fn get(&self, id: TagId) -> Result<Option<Tag>, StoreError>;

    /// Find the tag carrying `slug` in `namespace`.
    ///
    /// With `Some(locale)` the lookup is exact; with `None` any locale's
    /// translation may match, which is how create-or-reuse finds a tag that
    /// was first created under a different locale.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the lookup fails.
    fn find_by_namespace_and_slug(
        &self,
        namespace: &str,
        slug: &str,
        locale: Option<&str>,
    ) -> Result<Option<Tag>, StoreError>;

    /// All tags in a namespace, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if iteration fails.
    fn all_for_namespace(&self, namespace: &str) -> Result<Vec<Tag>, StoreError>;
}

/// Byte separating key fields in the slug index; cannot occur in a slug.
const FIELD_SEP: u8 = 0x1f;

fn slug_key(namespace: &str, slug: &str, locale: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(namespace.len() + slug.len() + locale.len() + 2);
    key.extend_from_slice(namespace.as_bytes());
    key.push(FIELD_SEP);
    key.extend_from_slice(slug.as_bytes());
    key.push(FIELD_SEP);
    key.extend_from_slice(locale.as_bytes());
    key
}

fn slug_prefix(namespace: &str, slug: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(namespace.len() + slug.len() + 2);
    key.extend_from_slice(namespace.as_bytes());
    key.push(FIELD_SEP);
    key.extend_from_slice(slug.as_bytes());
    key.push(FIELD_SEP);
    key
}

fn id_from_index(value: &[u8]) -> Result<TagId, StoreError> {
    let bytes: [u8; 8] = value
        .try_into()
        .map_err(|_| StoreError::CorruptIndex(format!("expected 8-byte id, got {}", value.len())))?;
    Ok(TagId(u64::from_be_bytes(bytes)))
}

fn reject_empty_slugs(translations: &BTreeMap<String, Translation>) -> Result<(), StoreError> {
    for (locale, translation) in translations {
        if translation.slug.is_empty() {
            return Err(StoreError::InvalidRecord(format!(
                "empty slug for locale {locale:?}"
            )));
        }
    }
    Ok(())
}

/// Sled-backed tag store
///
/// Uses two trees for efficient bidirectional lookups:
/// - `tags` tree: `tag_id` -> encoded [`Tag`] record
/// - `slugs` tree: `namespace \x1f slug \x1f locale` -> `tag_id`
pub struct SledTagStore {
    db: Db,
    tags: Tree,
    slugs: Tree,
}

impl SledTagStore {
    /// Opens or creates a store at the specified path
    ///
    /// # Examples
    /// ```no_run
    /// use taggable::store::SledTagStore;
    /// let store = SledTagStore::open("tag_db").unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the database cannot be opened or if the
    /// internal trees cannot be created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        let tags = db.open_tree("tags")?;
        let slugs = db.open_tree("slugs")?;
        Ok(Self { db, tags, slugs })
    }

    /// Flush all pending writes to disk
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the flush operation fails.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    /// Number of tag rows across all namespaces.
    #[must_use]
    pub fn count(&self) -> usize {
        self.tags.len()
    }

    fn decode_tag(value: &[u8]) -> Result<Tag, StoreError> {
        let (tag, _): (Tag, usize) =
            bincode::serde::decode_from_slice(value, bincode::config::standard())?;
        Ok(tag)
    }

    fn write_record(&self, tag: &Tag) -> Result<(), StoreError> {
        let value = bincode::serde::encode_to_vec(tag, bincode::config::standard())?;
        self.tags.insert(tag.id.0.to_be_bytes(), value)?;
        Ok(())
    }

    /// Claim a slug index entry for `id`, failing on a conflicting owner.
    fn claim_slug(&self, namespace: &str, slug: &str, locale: &str, id: TagId) -> Result<(), StoreError> {
        let id_bytes = id.0.to_be_bytes();
        let outcome = self
            .slugs
            .compare_and_swap(slug_key(namespace, slug, locale), None::<&[u8]>, Some(&id_bytes[..]))?;
        match outcome {
            Ok(()) => Ok(()),
            // Re-claiming our own entry is a no-op, anything else is a race lost.
            Err(cas) if cas.current.as_deref() == Some(&id_bytes[..]) => Ok(()),
            Err(_) => Err(StoreError::DuplicateNamespaceSlug {
                namespace: namespace.to_string(),
                slug: slug.to_string(),
                locale: locale.to_string(),
            }),
        }
    }
}

impl TagStore for SledTagStore {
    fn create(&self, draft: TagDraft) -> Result<Tag, StoreError> {
        reject_empty_slugs(&draft.translations)?;

        let now = Utc::now();
        let tag = Tag {
            id: TagId(self.db.generate_id()?),
            namespace: draft.namespace,
            translations: draft.translations,
            created_at: now,
            updated_at: now,
        };

        let mut claimed: Vec<Vec<u8>> = Vec::new();
        for (locale, translation) in &tag.translations {
            if let Err(err) = self.claim_slug(&tag.namespace, &translation.slug, locale, tag.id) {
                // Release what this create already claimed before reporting.
                for key in claimed {
                    self.slugs.remove(key)?;
                }
                return Err(err);
            }
            claimed.push(slug_key(&tag.namespace, &translation.slug, locale));
        }

        self.write_record(&tag)?;
        Ok(tag)
    }

    fn update(&self, id: TagId, patch: TagPatch) -> Result<Tag, StoreError> {
        reject_empty_slugs(&patch.translations)?;

        let mut tag = self.get(id)?.ok_or(StoreError::NotFound(id))?;
        for (locale, translation) in patch.translations {
            let previous = tag.translations.get(&locale);
            if previous.map(|t| t.slug.as_str()) != Some(translation.slug.as_str()) {
                self.claim_slug(&tag.namespace, &translation.slug, &locale, id)?;
                if let Some(old) = previous {
                    self.slugs.remove(slug_key(&tag.namespace, &old.slug, &locale))?;
                }
            }
            tag.translations.insert(locale, translation);
        }

        tag.updated_at = Utc::now();
        self.write_record(&tag)?;
        Ok(tag)
    }

    fn get(&self, id: TagId) -> Result<Option<Tag>, StoreError> {
        match self.tags.get(id.0.to_be_bytes())? {
            Some(value) => Ok(Some(Self::decode_tag(&value)?)),
            None => Ok(None),
        }
    }

    fn find_by_namespace_and_slug(
        &self,
        namespace: &str,
        slug: &str,
        locale: Option<&str>,
    ) -> Result<Option<Tag>, StoreError> {
        let id = match locale {
            Some(locale) => match self.slugs.get(slug_key(namespace, slug, locale))? {
                Some(value) => Some(id_from_index(&value)?),
                None => None,
            },
            None => match self.slugs.scan_prefix(slug_prefix(namespace, slug)).next() {
                Some(entry) => {
                    let (_, value) = entry?;
                    Some(id_from_index(&value)?)
                }
                None => None,
            },
        };

        match id {
            Some(id) => self.get(id),
            None => Ok(None),
        }
    }

    fn all_for_namespace(&self, namespace: &str) -> Result<Vec<Tag>, StoreError> {
        let mut tags = Vec::new();
        for entry in &self.tags {
            let (_, value) = entry?;
            let tag = Self::decode_tag(&value)?;
            if tag.namespace == namespace {
                tags.push(tag);
            }
        }
        Ok(tags)
    }
}

impl Drop for SledTagStore {
    fn drop(&mut self) {
        // Best-effort flush on drop. Errors are ignored since we can't
        // propagate them from Drop. Callers should explicitly flush()
        // if they need guaranteed durability.
        let _ = self.db.flush();
    }
}
