//! Sessions backed by the on-disk sled store

use super::test_utils::{author, committed, resolve};
use snaptree::store::DEFAULT_REFERENCE;
use snaptree::{EditError, ObjectStore, PublishOutcome, Session, SledObjectStore};
use std::sync::Arc;
use tempfile::TempDir;

fn open_store(dir: &TempDir) -> Arc<SledObjectStore> {
    Arc::new(SledObjectStore::new(dir.path().join("objects")).unwrap())
}

#[test]
fn test_publish_persists_objects_and_reference() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let mut session = Session::open(store.clone()).unwrap();
    session.write_file("src/main.rs", b"fn main() {}").unwrap();
    session.write_file("README.md", b"# Demo").unwrap();
    let (commit, tree) = committed(session.publish(&author(), Some("Initial import")).unwrap());
    store.flush().unwrap();

    assert_eq!(store.read_ref(DEFAULT_REFERENCE).unwrap(), Some(commit));
    assert!(store.contains(&commit).unwrap());
    assert!(store.contains(&tree).unwrap());

    let main = resolve(&*store, tree, "src/main.rs").unwrap();
    assert_eq!(store.get_blob(main.id).unwrap(), b"fn main() {}".to_vec());
    assert_eq!(store.get_commit(commit).unwrap().summary(), "Initial import");
}

#[test]
fn test_history_links_parents() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let mut session = Session::open(store.clone()).unwrap();

    let mut commits = Vec::new();
    for version in 0..3 {
        session
            .write_file("counter.txt", version.to_string().as_bytes())
            .unwrap();
        commits.push(committed(session.publish(&author(), None).unwrap()).0);
    }

    let head = store.get_commit(commits[2]).unwrap();
    assert_eq!(head.parents, vec![commits[1]]);
    let middle = store.get_commit(commits[1]).unwrap();
    assert_eq!(middle.parents, vec![commits[0]]);
    assert!(store.get_commit(commits[0]).unwrap().parents.is_empty());
}

#[test]
fn test_stale_session_is_rejected() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let mut fresh = Session::open(store.clone()).unwrap();
    let mut stale = Session::open(store.clone()).unwrap();
    fresh.write_file("a.txt", b"a").unwrap();
    let (winner, _) = committed(fresh.publish(&author(), None).unwrap());

    stale.move_file("a.txt", "b.txt").unwrap();
    assert!(matches!(
        stale.publish(&author(), None),
        Err(EditError::ConcurrentModification { .. })
    ));
    assert_eq!(store.read_ref(DEFAULT_REFERENCE).unwrap(), Some(winner));

    stale.discard().unwrap();
    stale.move_file("a.txt", "b.txt").unwrap();
    let (_, tree) = committed(stale.publish(&author(), None).unwrap());
    assert!(resolve(&*store, tree, "a.txt").is_none());
    assert!(resolve(&*store, tree, "b.txt").is_some());
}

#[test]
fn test_failed_move_keeps_reference() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let mut session = Session::open(store.clone()).unwrap();
    session.write_file("keep.txt", b"k").unwrap();
    let (commit, _) = committed(session.publish(&author(), None).unwrap());

    session.remove_file("keep.txt").unwrap();
    session.move_file("keep.txt", "moved.txt").unwrap();
    assert!(matches!(
        session.publish(&author(), None),
        Err(EditError::MoveOfDeletedPath { .. })
    ));
    assert_eq!(store.read_ref(DEFAULT_REFERENCE).unwrap(), Some(commit));

    session.discard().unwrap();
    assert_eq!(session.publish(&author(), None).unwrap(), PublishOutcome::Unchanged);
}
