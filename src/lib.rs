//! Taggable - namespaced tagging with slug normalization and set reconciliation
//!
//! This library lets arbitrary entities be labeled with free-form tags,
//! scoped by a namespace identifying the owning entity type. Tags are stored
//! once per namespace and reused across entities:
//!
//! - [`slug`] normalizes human text into canonical, URL-safe slugs.
//! - [`resolve::TagResolver`] maps a name to its single tag row, creating it
//!   on first use and absorbing duplicate-insert races.
//! - [`reconcile::Reconciler`] diffs an entity's current tag set against a
//!   desired one and applies the minimal attach/detach operations.
//! - [`entity::Taggable`] is the capability any domain type implements to
//!   take part; [`entity::where_tag`]/[`entity::with_tag`] define the AND/OR
//!   query semantics hosts must preserve.
//!
//! Persistence goes through the [`store::TagStore`] collaborator; a sled
//! backend and an in-memory backend ship in [`store`]. Tags are never
//! deleted by this crate — removing an entity's last association leaves the
//! tag row behind for reuse.
//!
//! # Examples
//!
//! ```
//! use taggable::config::TaggingConfig;
//! use taggable::entity::{AssociationSet, Taggable};
//! use taggable::reconcile::Reconciler;
//! use taggable::store::MemoryTagStore;
//!
//! struct Article {
//!     tags: AssociationSet,
//! }
//!
//! impl Taggable for Article {
//!     fn namespace(&self) -> &str {
//!         "article"
//!     }
//!     fn associations(&self) -> &AssociationSet {
//!         &self.tags
//!     }
//!     fn associations_mut(&mut self) -> &mut AssociationSet {
//!         &mut self.tags
//!     }
//! }
//!
//! let store = MemoryTagStore::new();
//! let reconciler = Reconciler::new(TaggingConfig::default());
//! let mut article = Article { tags: AssociationSet::new() };
//!
//! reconciler
//!     .set_tags(&store, &mut article, &["Rust".into(), "Systems".into()])
//!     .unwrap();
//! assert_eq!(article.associations().len(), 2);
//! ```

use thiserror::Error;

pub mod config;
pub mod entity;
pub mod hooks;
pub mod output;
pub mod reconcile;
pub mod resolve;
pub mod slug;
pub mod store;
pub mod tag;

#[cfg(test)]
pub mod testing;

/// Error enum, contains all failure states of the library
#[derive(Debug, Error)]
pub enum TaggableError {
    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
    /// A candidate tag name normalized to an empty slug
    #[error("Invalid tag name {0:?}: normalizes to an empty slug")]
    InvalidTagName(String),
}

pub use config::TaggingConfig;
pub use entity::{Association, AssociationSet, Taggable};
pub use hooks::{HookChain, TagHook};
pub use output::TagView;
pub use reconcile::Reconciler;
pub use resolve::TagResolver;
pub use slug::{slugify, slugify_with};
pub use store::{MemoryTagStore, SledTagStore, StoreError, TagStore};
pub use tag::{MatchField, Tag, TagDraft, TagId, TagPatch, Translation};
