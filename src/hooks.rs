//! Tag lifecycle hooks
//!
//! An explicit, ordered chain of observers around tag persistence. The
//! pre-persistence hooks (`on_creating`, `on_updating`) receive the attribute
//! set that is about to be written and return the set that actually gets
//! persisted, so a hook can normalize, enrich or veto individual fields. The
//! post-persistence hooks (`on_created`, `on_updated`) observe the stored row
//! and cannot change it.
//!
//! Hooks run in registration order; each pre-hook sees the output of the one
//! before it.

use std::fmt;

use crate::tag::{Tag, TagDraft, TagPatch};

/// Observer for tag creation and update.
///
/// Every method has a pass-through default, so implementors only override
/// the stages they care about.
pub trait TagHook {
    /// Called before a new tag is persisted; returns the draft to persist.
    fn on_creating(&self, draft: TagDraft) -> TagDraft {
        draft
    }

    /// Called after a new tag was persisted.
    fn on_created(&self, _tag: &Tag) {}

    /// Called before translations are merged into `tag`; returns the patch
    /// to apply.
    fn on_updating(&self, _tag: &Tag, patch: TagPatch) -> TagPatch {
        patch
    }

    /// Called after an update was persisted.
    fn on_updated(&self, _tag: &Tag) {}
}

/// Ordered collection of [`TagHook`]s.
#[derive(Default)]
pub struct HookChain {
    hooks: Vec<Box<dyn TagHook>>,
}

impl HookChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook; it runs after every hook registered before it.
    pub fn register<H: TagHook + 'static>(&mut self, hook: H) {
        self.hooks.push(Box::new(hook));
    }

    /// Fluent variant of [`register`](Self::register).
    #[must_use]
    pub fn with<H: TagHook + 'static>(mut self, hook: H) -> Self {
        self.register(hook);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run the `creating` stage, threading the draft through every hook.
    #[must_use]
    pub fn creating(&self, draft: TagDraft) -> TagDraft {
        self.hooks.iter().fold(draft, |draft, hook| hook.on_creating(draft))
    }

    /// Notify every hook of a persisted tag.
    pub fn created(&self, tag: &Tag) {
        for hook in &self.hooks {
            hook.on_created(tag);
        }
    }

    /// Run the `updating` stage, threading the patch through every hook.
    #[must_use]
    pub fn updating(&self, tag: &Tag, patch: TagPatch) -> TagPatch {
        self.hooks.iter().fold(patch, |patch, hook| hook.on_updating(tag, patch))
    }

    /// Notify every hook of a persisted update.
    pub fn updated(&self, tag: &Tag) {
        for hook in &self.hooks {
            hook.on_updated(tag);
        }
    }
}

impl fmt::Debug for HookChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookChain").field("hooks", &self.hooks.len()).finish()
    }
}
