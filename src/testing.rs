//! Testing utilities
//!
//! Helper types for unit tests: a temporary sled store that cleans up on
//! drop, and a minimal taggable entity.
//!
//! Only available when compiled with `cfg(test)`.

use std::path::Path;
use tempfile::TempDir;

use crate::entity::{AssociationSet, Taggable};
use crate::store::SledTagStore;

/// Temporary sled-backed tag store for tests
///
/// The backing directory is removed when the wrapper goes out of scope.
///
/// # Examples
/// ```ignore
/// let scratch = ScratchStore::new();
/// let tag = scratch.store().create(draft).unwrap();
/// // Directory cleaned up when scratch is dropped
/// ```
pub struct ScratchStore {
    dir: TempDir,
    store: SledTagStore,
}

impl ScratchStore {
    /// Open a fresh store under a temporary directory.
    ///
    /// # Panics
    /// Panics if the directory or the store cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store = SledTagStore::open(dir.path().join("tags")).expect("Failed to open test store");
        Self { dir, store }
    }

    /// Get a reference to the underlying store
    #[must_use]
    pub fn store(&self) -> &SledTagStore {
        &self.store
    }

    /// Get the path of the backing directory
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Default for ScratchStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimal taggable entity used across unit tests
pub struct Article {
    pub id: u64,
    tags: AssociationSet,
}

impl Article {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            tags: AssociationSet::new(),
        }
    }
}

impl Taggable for Article {
    fn namespace(&self) -> &str {
        "article"
    }

    fn associations(&self) -> &AssociationSet {
        &self.tags
    }

    fn associations_mut(&mut self) -> &mut AssociationSet {
        &mut self.tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaggingConfig;
    use crate::reconcile::Reconciler;

    #[test]
    fn test_scratch_store_is_usable() {
        let scratch = ScratchStore::new();
        let reconciler = Reconciler::new(TaggingConfig::default());
        let mut article = Article::new(1);

        reconciler.add_tag(scratch.store(), &mut article, "Rust").unwrap();
        assert_eq!(article.associations().len(), 1);
        assert!(scratch.path().exists());
    }
}
