//! Tag data model
//!
//! A [`Tag`] belongs to exactly one namespace (the vocabulary of one entity
//! type) and carries one `{slug, name}` [`Translation`] per locale. Within a
//! namespace and locale the slug is unique; the store enforces that (see
//! `store::StoreError::DuplicateNamespaceSlug`).
//!
//! Tags are created lazily on first use and never deleted by this crate —
//! a tag whose last association is removed simply stays in the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Store-assigned tag identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TagId(pub u64);

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which tag field reconciliation and queries match against.
///
/// Slugs are canonical and deterministic, so slug matching is the default
/// everywhere; name matching compares the raw display name instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchField {
    /// Match the normalized slug (default)
    #[default]
    Slug,
    /// Match the display name as entered
    Name,
}

/// Locale-scoped `{slug, name}` pair attached to a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    /// Canonical, URL-safe identifier
    pub slug: String,
    /// Display name as the user entered it
    pub name: String,
}

impl Translation {
    #[must_use]
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
        }
    }

    /// The value this translation exposes for the given match field.
    #[must_use]
    pub fn value(&self, field: MatchField) -> &str {
        match field {
            MatchField::Slug => &self.slug,
            MatchField::Name => &self.name,
        }
    }
}

/// A tag row: namespace plus one translation per locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Store-assigned identity
    pub id: TagId,
    /// Vocabulary this tag belongs to
    pub namespace: String,
    /// Locale code to `{slug, name}`
    pub translations: BTreeMap<String, Translation>,
    /// When the row was first persisted
    pub created_at: DateTime<Utc>,
    /// Last translation change
    pub updated_at: DateTime<Utc>,
}

impl Tag {
    /// Translation for an exact locale, no fallback.
    #[must_use]
    pub fn translation(&self, locale: &str) -> Option<&Translation> {
        self.translations.get(locale)
    }

    /// Slug for an exact locale.
    #[must_use]
    pub fn slug(&self, locale: &str) -> Option<&str> {
        self.translation(locale).map(|t| t.slug.as_str())
    }

    /// Display name for an exact locale.
    #[must_use]
    pub fn name(&self, locale: &str) -> Option<&str> {
        self.translation(locale).map(|t| t.name.as_str())
    }

    /// Whether any locale of this tag carries the given slug.
    #[must_use]
    pub fn has_slug(&self, slug: &str) -> bool {
        self.translations.values().any(|t| t.slug == slug)
    }

    /// All values of the given match field across locales.
    pub fn values(&self, field: MatchField) -> impl Iterator<Item = &str> {
        self.translations.values().map(move |t| t.value(field))
    }

    /// The representative value used when diffing an entity's current tag
    /// set: the translation for `locale` when present, otherwise the first
    /// translation the tag has. Every persisted tag carries at least one
    /// translation, so this only returns `None` for a malformed row.
    #[must_use]
    pub fn match_value(&self, field: MatchField, locale: &str) -> Option<&str> {
        self.translations
            .get(locale)
            .or_else(|| self.translations.values().next())
            .map(|t| t.value(field))
    }
}

/// Attribute set for a tag that is about to be persisted.
///
/// Pre-persistence hooks (`hooks::TagHook::on_creating`) receive and may
/// rewrite this before the store sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDraft {
    pub namespace: String,
    pub translations: BTreeMap<String, Translation>,
}

impl TagDraft {
    /// Draft with a single translation entry.
    #[must_use]
    pub fn new(namespace: impl Into<String>, locale: impl Into<String>, translation: Translation) -> Self {
        let mut translations = BTreeMap::new();
        translations.insert(locale.into(), translation);
        Self {
            namespace: namespace.into(),
            translations,
        }
    }

    /// Add another locale entry to the draft.
    #[must_use]
    pub fn with_translation(mut self, locale: impl Into<String>, translation: Translation) -> Self {
        self.translations.insert(locale.into(), translation);
        self
    }
}

/// Translation entries to merge into an existing tag.
///
/// Locales already present on the tag are overwritten, others are added;
/// the update path never removes a locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPatch {
    pub translations: BTreeMap<String, Translation>,
}

impl TagPatch {
    /// Patch carrying a single locale entry.
    #[must_use]
    pub fn translation(locale: impl Into<String>, translation: Translation) -> Self {
        let mut patch = Self::default();
        patch.translations.insert(locale.into(), translation);
        patch
    }
}
