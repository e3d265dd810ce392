//! Publishing batches through sessions on an in-memory store

use super::test_utils::{author, build_tree, committed, resolve};
use snaptree::events::{EditEvent, EventBus};
use snaptree::store::{Commit, DEFAULT_REFERENCE};
use snaptree::tree::hasher::empty_tree_id;
use snaptree::tree::EntryMode;
use snaptree::{
    EditError, MemoryObjectStore, ObjectStore, Operation, PublishOutcome, Session, SessionState,
};
use std::sync::Arc;

/// Commit `tree` on the default reference so sessions start from it
fn seed(store: &MemoryObjectStore, tree: snaptree::ObjectId) -> snaptree::ObjectId {
    let commit = store
        .put_commit(&Commit {
            tree,
            parents: vec![],
            author: author(),
            committer: author(),
            message: "seed".to_string(),
        })
        .unwrap();
    store.update_ref(DEFAULT_REFERENCE, None, commit).unwrap();
    commit
}

#[test]
fn test_insert_into_empty_tree_creates_directories() {
    let store = Arc::new(MemoryObjectStore::new());
    let id_x = store.put_blob(b"x").unwrap();
    let mut session = Session::open(store.clone()).unwrap();

    session.stage(Operation::insert("a/b/c.txt", id_x).unwrap());
    let (_, tree) = committed(session.publish(&author(), None).unwrap());

    assert_eq!(resolve(&*store, tree, "a/b/c.txt").unwrap().id, id_x);
    assert_eq!(resolve(&*store, tree, "a").unwrap().mode, EntryMode::Tree);
    assert_eq!(resolve(&*store, tree, "a/b").unwrap().mode, EntryMode::Tree);

    let root = store.get_tree(tree).unwrap();
    assert_eq!(root.len(), 1);
    let a = store.get_tree(root.get("a").unwrap().id).unwrap();
    assert_eq!(a.len(), 1);
}

#[test]
fn test_removing_last_file_yields_empty_tree() {
    let store = Arc::new(MemoryObjectStore::new());
    let base = build_tree(&*store, &[("a/b/c.txt", b"c")]);
    seed(&store, base);

    let mut session = Session::open(store.clone()).unwrap();
    session.stage(Operation::remove("a/b/c.txt").unwrap());
    let (_, tree) = committed(session.publish(&author(), None).unwrap());

    assert_eq!(tree, empty_tree_id());
    assert!(store.get_tree(tree).unwrap().is_empty());
}

#[test]
fn test_concurrent_sessions_second_publish_fails() {
    let store = Arc::new(MemoryObjectStore::new());
    let base = build_tree(&*store, &[("README", b"hello")]);
    seed(&store, base);

    let mut first = Session::open(store.clone()).unwrap();
    let mut second = Session::open(store.clone()).unwrap();

    first.write_file("one.txt", b"1").unwrap();
    let (winner, _) = committed(first.publish(&author(), None).unwrap());

    second.write_file("two.txt", b"2").unwrap();
    let objects_before = store.len();
    match second.publish(&author(), None) {
        Err(EditError::ConcurrentModification { expected, actual }) => {
            assert_eq!(expected, base);
            assert_eq!(actual, first.base_tree());
        }
        other => panic!("expected concurrent modification, got {:?}", other),
    }

    assert_eq!(store.read_ref(DEFAULT_REFERENCE).unwrap(), Some(winner));
    assert_eq!(store.len(), objects_before);
    assert_eq!(second.state(), SessionState::Conflict);
}

#[test]
fn test_restage_after_conflict_succeeds() {
    let store = Arc::new(MemoryObjectStore::new());
    let mut first = Session::open(store.clone()).unwrap();
    let mut second = Session::open(store.clone()).unwrap();

    first.write_file("one.txt", b"1").unwrap();
    let (winner, _) = committed(first.publish(&author(), None).unwrap());

    second.write_file("two.txt", b"2").unwrap();
    assert!(second.publish(&author(), None).is_err());

    second.discard().unwrap();
    second.write_file("two.txt", b"2").unwrap();
    let (commit, tree) = committed(second.publish(&author(), None).unwrap());

    assert_eq!(store.get_commit(commit).unwrap().parents, vec![winner]);
    assert!(resolve(&*store, tree, "one.txt").is_some());
    assert!(resolve(&*store, tree, "two.txt").is_some());
}

#[test]
fn test_publish_without_changes_is_noop() {
    let store = Arc::new(MemoryObjectStore::new());
    let mut session = Session::open(store.clone()).unwrap();
    session.write_file("a.txt", b"a").unwrap();
    let (commit, _) = committed(session.publish(&author(), None).unwrap());

    assert_eq!(session.publish(&author(), None).unwrap(), PublishOutcome::Unchanged);
    assert_eq!(store.read_ref(DEFAULT_REFERENCE).unwrap(), Some(commit));
}

#[test]
fn test_batch_that_cancels_out_creates_no_commit() {
    let store = Arc::new(MemoryObjectStore::new());
    let mut session = Session::open(store.clone()).unwrap();
    session.write_file("tmp/scratch.txt", b"scratch").unwrap();
    session.remove_file("tmp/scratch.txt").unwrap();

    assert_eq!(session.publish(&author(), None).unwrap(), PublishOutcome::Unchanged);
    assert_eq!(store.read_ref(DEFAULT_REFERENCE).unwrap(), None);
    assert_eq!(session.state(), SessionState::Clean);
}

#[test]
fn test_path_collision_aborts_batch() {
    let store = Arc::new(MemoryObjectStore::new());
    let blob = store.put_blob(b"content").unwrap();
    let mut session = Session::open(store.clone()).unwrap();
    session.stage(Operation::insert("a", blob).unwrap());
    session.stage(Operation::insert("a/b", blob).unwrap());

    match session.publish(&author(), None) {
        Err(EditError::PathCollision { file, nested }) => {
            assert_eq!(file, "a");
            assert_eq!(nested, "a/b");
        }
        other => panic!("expected path collision, got {:?}", other),
    }
    assert_eq!(store.read_ref(DEFAULT_REFERENCE).unwrap(), None);
    assert_eq!(session.state(), SessionState::Staged);
}

#[test]
fn test_rename_then_edit_in_one_batch() {
    let store = Arc::new(MemoryObjectStore::new());
    let base = build_tree(&*store, &[("docs/intro.md", b"v1"), ("docs/usage.md", b"u")]);
    seed(&store, base);

    let mut session = Session::open(store.clone()).unwrap();
    session.move_file("docs", "guide").unwrap();
    session.write_file("guide/intro.md", b"v2").unwrap();
    let (commit, tree) = committed(session.publish(&author(), Some("Rename docs")).unwrap());

    assert!(resolve(&*store, tree, "docs").is_none());
    let intro = resolve(&*store, tree, "guide/intro.md").unwrap();
    assert_eq!(store.get_blob(intro.id).unwrap(), b"v2".to_vec());
    assert!(resolve(&*store, tree, "guide/usage.md").is_some());

    let message = store.get_commit(commit).unwrap().message;
    assert_eq!(message, "Rename docs\n\n    R  docs -> guide\n    M  guide/intro.md");
}

#[test]
fn test_observer_sees_conflict() {
    let store = Arc::new(MemoryObjectStore::new());
    let (bus, events) = EventBus::new_pair();
    let mut first = Session::open(store.clone()).unwrap();
    let mut second = Session::open(store.clone()).unwrap().with_observer(Arc::new(bus));

    first.write_file("a.txt", b"a").unwrap();
    first.publish(&author(), None).unwrap();
    second.write_file("b.txt", b"b").unwrap();
    let _ = second.publish(&author(), None);

    let received: Vec<EditEvent> = events.try_iter().collect();
    assert!(matches!(received.last(), Some(EditEvent::Conflict { .. })));
}

#[test]
fn test_sessions_on_separate_references_do_not_conflict() {
    let store = Arc::new(MemoryObjectStore::new());
    let mut main = Session::open(store.clone()).unwrap();
    let mut topic = Session::open_reference(store.clone(), "refs/heads/topic").unwrap();

    main.write_file("main.txt", b"m").unwrap();
    topic.write_file("topic.txt", b"t").unwrap();
    committed(main.publish(&author(), None).unwrap());
    let (_, tree) = committed(topic.publish(&author(), None).unwrap());

    assert!(resolve(&*store, tree, "main.txt").is_none());
    assert!(store.read_ref("refs/heads/topic").unwrap().is_some());
}
