//! Integration tests for taggable
//!
//! These tests verify end-to-end behavior over a real sled store: full
//! reconciliation workflows, create-or-reuse across entities, query
//! semantics and orphan retention.

use tempfile::TempDir;

use taggable::config::TaggingConfig;
use taggable::entity::{AssociationSet, Taggable, where_tag, with_tag};
use taggable::hooks::{HookChain, TagHook};
use taggable::output::TagView;
use taggable::reconcile::Reconciler;
use taggable::resolve::TagResolver;
use taggable::store::{SledTagStore, TagStore};
use taggable::tag::{MatchField, Tag, TagDraft};

struct Post {
    name: &'static str,
    tags: AssociationSet,
}

impl Post {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            tags: AssociationSet::new(),
        }
    }
}

impl Taggable for Post {
    fn namespace(&self) -> &str {
        "post"
    }

    fn associations(&self) -> &AssociationSet {
        &self.tags
    }

    fn associations_mut(&mut self) -> &mut AssociationSet {
        &mut self.tags
    }
}

/// Helper to create a store in a fresh temporary directory
fn setup_store() -> (SledTagStore, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = SledTagStore::open(dir.path().join("tags")).unwrap();
    (store, dir)
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn slugs(post: &Post, store: &SledTagStore) -> Vec<String> {
    post.tags(store)
        .unwrap()
        .iter()
        .filter_map(|t| t.slug("en").map(ToString::to_string))
        .collect()
}

#[test]
fn test_full_reconciliation_workflow() {
    let (store, _dir) = setup_store();
    let reconciler = Reconciler::new(TaggingConfig::default());
    let mut post = Post::new("intro");

    reconciler.set_tags(&store, &mut post, &names(&["a", "b"])).unwrap();
    assert_eq!(slugs(&post, &store), vec!["a", "b"]);

    reconciler.set_tags(&store, &mut post, &names(&["b", "c"])).unwrap();
    assert_eq!(slugs(&post, &store), vec!["b", "c"]);

    // "a" was detached but its row survives for reuse.
    let orphan = store.find_by_namespace_and_slug("post", "a", None).unwrap();
    assert!(orphan.is_some());
    assert_eq!(store.count(), 3);

    // Re-adding "a" reuses the orphaned row rather than minting a new one.
    let before = orphan.unwrap().id;
    reconciler.tag(&store, &mut post, &names(&["a"])).unwrap();
    let after = store
        .find_by_namespace_and_slug("post", "a", None)
        .unwrap()
        .unwrap()
        .id;
    assert_eq!(before, after);
    assert_eq!(store.count(), 3);
}

#[test]
fn test_tags_are_shared_across_entities() {
    let (store, _dir) = setup_store();
    let reconciler = Reconciler::new(TaggingConfig::default());
    let mut first = Post::new("first");
    let mut second = Post::new("second");

    reconciler.add_tag(&store, &mut first, "Shared Topic").unwrap();
    reconciler.add_tag(&store, &mut second, "shared_topic").unwrap();

    // One row, two associations.
    assert_eq!(store.count(), 1);
    assert_eq!(
        first.associations().iter().collect::<Vec<_>>(),
        second.associations().iter().collect::<Vec<_>>()
    );
}

#[test]
fn test_repeated_add_never_duplicates() {
    let (store, _dir) = setup_store();
    let reconciler = Reconciler::new(TaggingConfig::default());
    let mut post = Post::new("dup");

    for _ in 0..3 {
        reconciler.add_tag(&store, &mut post, "Go").unwrap();
    }

    assert_eq!(store.count(), 1);
    assert_eq!(post.associations().len(), 1);
}

#[test]
fn test_query_and_or_semantics() {
    let (store, _dir) = setup_store();
    let reconciler = Reconciler::new(TaggingConfig::default());

    let mut e1 = Post::new("e1");
    let mut e2 = Post::new("e2");
    let mut e3 = Post::new("e3");
    reconciler.tag(&store, &mut e1, &names(&["x"])).unwrap();
    reconciler.tag(&store, &mut e2, &names(&["y"])).unwrap();
    reconciler.tag(&store, &mut e3, &names(&["x", "y"])).unwrap();
    let posts = vec![e1, e2, e3];

    let both = where_tag(&posts, &store, &names(&["x", "y"]), MatchField::Slug).unwrap();
    assert_eq!(both.iter().map(|p| p.name).collect::<Vec<_>>(), vec!["e3"]);

    let either = with_tag(&posts, &store, &names(&["x", "y"]), MatchField::Slug).unwrap();
    assert_eq!(
        either.iter().map(|p| p.name).collect::<Vec<_>>(),
        vec!["e1", "e2", "e3"]
    );
}

#[test]
fn test_untag_everything_retains_rows() {
    let (store, _dir) = setup_store();
    let reconciler = Reconciler::new(TaggingConfig::default());
    let mut post = Post::new("cleared");

    reconciler.set_tags(&store, &mut post, &names(&["a", "b", "c"])).unwrap();
    reconciler.untag(&store, &mut post, None).unwrap();

    assert!(post.tags(&store).unwrap().is_empty());
    assert_eq!(store.count(), 3);
}

#[test]
fn test_reconciliation_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tags");
    let reconciler = Reconciler::new(TaggingConfig::default());
    let mut post = Post::new("persistent");

    {
        let store = SledTagStore::open(&path).unwrap();
        reconciler.set_tags(&store, &mut post, &names(&["keep"])).unwrap();
        store.flush().unwrap();
    }

    let store = SledTagStore::open(&path).unwrap();
    assert_eq!(slugs(&post, &store), vec!["keep"]);

    // The diff still converges against the reopened store.
    reconciler.set_tags(&store, &mut post, &names(&["keep", "more"])).unwrap();
    assert_eq!(slugs(&post, &store), vec!["keep", "more"]);
    assert_eq!(store.count(), 2);
}

#[test]
fn test_hooks_participate_in_persistence() {
    struct Auditor;
    impl TagHook for Auditor {
        fn on_creating(&self, mut draft: TagDraft) -> TagDraft {
            for translation in draft.translations.values_mut() {
                translation.name = format!("[{}]", translation.name);
            }
            draft
        }
    }

    let (store, _dir) = setup_store();
    let hooks = HookChain::new().with(Auditor);
    let resolver = TagResolver::with_hooks(TaggingConfig::default(), hooks);
    let reconciler = Reconciler::with_resolver(resolver);
    let mut post = Post::new("audited");

    reconciler.add_tag(&store, &mut post, "Rust").unwrap();

    let tag: Tag = store
        .find_by_namespace_and_slug("post", "rust", None)
        .unwrap()
        .unwrap();
    assert_eq!(tag.name("en"), Some("[Rust]"));
}

#[test]
fn test_projection_over_workflow() {
    let (store, _dir) = setup_store();
    let reconciler = Reconciler::new(TaggingConfig::default());
    let mut post = Post::new("projected");

    reconciler.set_tags(&store, &mut post, &names(&["First Tag", "Second Tag"])).unwrap();

    let views = TagView::project_all(&post.tags(&store).unwrap(), "en");
    assert_eq!(views.len(), 2);
    assert_eq!(views[0].slug, "first-tag");
    assert_eq!(views[0].name, "First Tag");
    // Locale without translations projects to nothing.
    assert!(TagView::project_all(&post.tags(&store).unwrap(), "de").is_empty());
}

#[test]
fn test_locale_aware_workflow() {
    let (store, _dir) = setup_store();
    let config = TaggingConfig::default().with_default_locale("de");
    let reconciler = Reconciler::new(config);
    let mut post = Post::new("lokalisiert");

    reconciler.add_tag(&store, &mut post, "Rost").unwrap();

    let tag = store
        .find_by_namespace_and_slug("post", "rost", Some("de"))
        .unwrap()
        .unwrap();
    assert_eq!(tag.name("de"), Some("Rost"));

    // A second locale joins the same row through the resolver update path.
    let updated = reconciler
        .resolver()
        .add_translation(&store, tag.id, "en", "Rust")
        .unwrap();
    assert_eq!(updated.translations.len(), 2);

    // Resolving the English spelling now reuses the same row.
    let reused = reconciler
        .resolver()
        .resolve(&store, "post", "Rust", "en")
        .unwrap();
    assert_eq!(reused.id, tag.id);
    assert_eq!(store.count(), 1);
}
