//! Taggable entities and their associations
//!
//! Any domain type becomes taggable by implementing [`Taggable`]: it names
//! the vocabulary it draws from (`namespace`) and exposes its association
//! set. Attach and detach are idempotent — attaching a present tag and
//! detaching an absent one are both no-ops — so the reconciler can apply
//! its diff without read-modify-write ceremony.
//!
//! The association set holds tag ids only; resolving ids back into [`Tag`]
//! rows goes through the store, keeping entities free of any persistence
//! handle.

use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};

use crate::store::{StoreError, TagStore};
use crate::tag::{Tag, TagId};

pub mod query;

pub use query::{where_tag, with_tag};

/// Capability set of a taggable entity.
pub trait Taggable {
    /// Stable identifier of the vocabulary this entity draws tags from.
    ///
    /// Conventionally the snake_case name of the entity type (see
    /// [`namespace_from_type`]); types sharing one tag vocabulary return
    /// the same value.
    fn namespace(&self) -> &str;

    /// Currently attached tag ids, in first-attach order.
    fn associations(&self) -> &AssociationSet;

    fn associations_mut(&mut self) -> &mut AssociationSet;

    /// Attach a tag; returns `false` if it was already attached.
    fn attach(&mut self, tag: TagId) -> bool {
        self.associations_mut().insert(tag)
    }

    /// Detach a tag; returns `false` if it was not attached.
    fn detach(&mut self, tag: TagId) -> bool {
        self.associations_mut().remove(tag)
    }

    fn has_tag(&self, tag: TagId) -> bool {
        self.associations().contains(tag)
    }

    /// Currently attached tags, resolved through the store in attach order.
    ///
    /// Ids the store cannot resolve are skipped; an association can only
    /// dangle when the host bypassed this crate, since tags are never
    /// deleted here.
    ///
    /// # Errors
    ///
    /// Returns a store error if a lookup fails.
    fn tags(&self, store: &dyn TagStore) -> Result<Vec<Tag>, StoreError> {
        let set = self.associations();
        let mut tags = Vec::with_capacity(set.len());
        for id in set.iter() {
            if let Some(tag) = store.get(id)? {
                tags.push(tag);
            }
        }
        Ok(tags)
    }
}

/// Ordered set of tag ids attached to one entity.
///
/// Keeps first-attach order and rejects duplicates, mirroring a unique
/// (taggable, tag) pair constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationSet {
    ids: Vec<TagId>,
}

impl AssociationSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an id; returns `false` if it was already present.
    pub fn insert(&mut self, tag: TagId) -> bool {
        if self.ids.contains(&tag) {
            return false;
        }
        self.ids.push(tag);
        true
    }

    /// Remove an id; returns `false` if it was not present.
    pub fn remove(&mut self, tag: TagId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| *id != tag);
        self.ids.len() != before
    }

    #[must_use]
    pub fn contains(&self, tag: TagId) -> bool {
        self.ids.contains(&tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = TagId> + '_ {
        self.ids.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Materialize the set as association records for one entity, e.g. for
    /// a host that persists the pairs itself.
    #[must_use]
    pub fn associations(&self, namespace: &str, taggable_id: &str) -> Vec<Association> {
        self.ids
            .iter()
            .map(|&tag_id| Association {
                namespace: namespace.to_string(),
                taggable_id: taggable_id.to_string(),
                tag_id,
            })
            .collect()
    }
}

/// The (taggable, tag) pair as a standalone record.
///
/// Has no identity beyond the triple; equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    /// Namespace of the owning entity type
    pub namespace: String,
    /// Host-scoped identifier of the entity
    pub taggable_id: String,
    /// The attached tag
    pub tag_id: TagId,
}

/// Conventional namespace for an entity type: the snake_case form of its
/// unqualified type name (`BlogPost` becomes `blog_post`).
#[must_use]
pub fn namespace_from_type<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.rsplit("::").next().unwrap_or(full);
    base.to_snake_case()
}
