//! Presentation projection
//!
//! Flattens a [`Tag`] plus one resolved locale into the `{id, slug, name}`
//! shape external consumers see. Nothing else about a tag — its namespace,
//! other locales, timestamps — leaks through this surface.

use serde::{Deserialize, Serialize};

use crate::tag::Tag;

/// One tag as presented for a single locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagView {
    pub id: u64,
    pub slug: String,
    pub name: String,
}

impl TagView {
    /// Project a tag in the given locale; `None` when the tag has no
    /// translation for it (no fallback).
    #[must_use]
    pub fn project(tag: &Tag, locale: &str) -> Option<Self> {
        let translation = tag.translation(locale)?;
        Some(Self {
            id: tag.id.0,
            slug: translation.slug.clone(),
            name: translation.name.clone(),
        })
    }

    /// Project every tag that has the locale, skipping the rest.
    #[must_use]
    pub fn project_all(tags: &[Tag], locale: &str) -> Vec<Self> {
        tags.iter().filter_map(|tag| Self::project(tag, locale)).collect()
    }

    /// Render as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json` error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
