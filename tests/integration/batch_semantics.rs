//! Batch simplification and its agreement with one-at-a-time edits

use super::test_utils::{build_tree, resolve};
use snaptree::changeset::{apply, simplify, Outcome};
use snaptree::events::NullObserver;
use snaptree::tree::hasher::empty_tree_id;
use snaptree::tree::{editor, EntryMode};
use snaptree::{EditError, MemoryObjectStore, ObjectId, ObjectStore, Operation};

fn batch(store: &MemoryObjectStore, base: ObjectId, ops: &[Operation]) -> ObjectId {
    let nested = simplify(store, base, ops).unwrap().changes.nest().unwrap();
    apply(store, base, &nested).unwrap()
}

fn sequential(store: &MemoryObjectStore, base: ObjectId, ops: &[Operation]) -> ObjectId {
    ops.iter().fold(base, |root, op| match op {
        Operation::Insert { path, id } => {
            editor::insert(store, root, path, *id, EntryMode::Blob).unwrap()
        }
        Operation::Remove { path } => editor::remove(store, root, path).unwrap(),
        Operation::Move { from, to } => {
            editor::move_entry(store, root, from, to, &NullObserver).unwrap()
        }
    })
}

fn project(store: &MemoryObjectStore) -> ObjectId {
    build_tree(
        store,
        &[
            ("Cargo.toml", b"[package]"),
            ("src/lib.rs", b"pub mod a;"),
            ("src/a.rs", b"fn a() {}"),
            ("src/nested/deep.rs", b"deep"),
            ("docs/index.md", b"# Docs"),
        ],
    )
}

#[test]
fn test_insert_then_remove_leaves_tombstone() {
    let store = MemoryObjectStore::new();
    let c1 = store.put_blob(b"c1").unwrap();
    let ops = vec![
        Operation::insert("x", c1).unwrap(),
        Operation::remove("x").unwrap(),
    ];

    let simplified = simplify(&store, empty_tree_id(), &ops).unwrap();
    assert_eq!(simplified.changes.len(), 1);
    assert_eq!(simplified.changes.outcome("x"), Some(Outcome::Tombstone));
}

#[test]
fn test_insert_then_move_writes_destination() {
    let store = MemoryObjectStore::new();
    let c1 = store.put_blob(b"c1").unwrap();
    let ops = vec![
        Operation::insert("x", c1).unwrap(),
        Operation::moved("x", "y").unwrap(),
    ];

    let simplified = simplify(&store, empty_tree_id(), &ops).unwrap();
    assert_eq!(simplified.changes.len(), 2);
    assert_eq!(simplified.changes.outcome("x"), Some(Outcome::Tombstone));
    assert_eq!(
        simplified.changes.outcome("y"),
        Some(Outcome::Write {
            id: c1,
            mode: EntryMode::Blob
        })
    );
}

#[test]
fn test_move_of_removed_path_reports_both_paths() {
    let store = MemoryObjectStore::new();
    let base = project(&store);
    let ops = vec![
        Operation::remove("src").unwrap(),
        Operation::moved("src/a.rs", "a.rs").unwrap(),
    ];

    match simplify(&store, base, &ops) {
        Err(EditError::MoveOfDeletedPath { from, to }) => {
            assert_eq!(from, "src/a.rs");
            assert_eq!(to, "a.rs");
        }
        other => panic!("expected move of deleted path, got {:?}", other),
    }
}

#[test]
fn test_summaries_follow_operation_order() {
    let store = MemoryObjectStore::new();
    let base = project(&store);
    let blob = store.put_blob(b"new").unwrap();
    let ops = vec![
        Operation::insert("src/b.rs", blob).unwrap(),
        Operation::insert("src/a.rs", blob).unwrap(),
        Operation::remove("docs/index.md").unwrap(),
        Operation::moved("src", "lib").unwrap(),
    ];

    let simplified = simplify(&store, base, &ops).unwrap();
    assert_eq!(
        simplified.summaries,
        vec![
            "    A  src/b.rs",
            "    M  src/a.rs",
            "    D  docs/index.md",
            "    R  src -> lib",
        ]
    );
}

#[test]
fn test_directory_rename_with_edits_matches_sequential() {
    let store = MemoryObjectStore::new();
    let base = project(&store);
    let blob = store.put_blob(b"edited").unwrap();
    let ops = vec![
        Operation::insert("src/nested/extra.rs", blob).unwrap(),
        Operation::moved("src", "crates/core/src").unwrap(),
        Operation::insert("crates/core/src/a.rs", blob).unwrap(),
        Operation::remove("crates/core/src/nested/deep.rs").unwrap(),
    ];

    let result = batch(&store, base, &ops);
    assert_eq!(result, sequential(&store, base, &ops));
    assert!(resolve(&store, result, "src").is_none());
    assert_eq!(
        resolve(&store, result, "crates/core/src/nested/extra.rs").unwrap().id,
        blob
    );
}

#[test]
fn test_swap_through_temporary_matches_sequential() {
    let store = MemoryObjectStore::new();
    let base = project(&store);
    let ops = vec![
        Operation::moved("src/a.rs", "tmp").unwrap(),
        Operation::moved("src/lib.rs", "src/a.rs").unwrap(),
        Operation::moved("tmp", "src/lib.rs").unwrap(),
    ];

    let result = batch(&store, base, &ops);
    assert_eq!(result, sequential(&store, base, &ops));

    let lib = resolve(&store, result, "src/lib.rs").unwrap();
    assert_eq!(store.get_blob(lib.id).unwrap(), b"fn a() {}".to_vec());
    assert!(resolve(&store, result, "tmp").is_none());
}

#[test]
fn test_emptying_directory_by_moves_prunes_it() {
    let store = MemoryObjectStore::new();
    let base = build_tree(&store, &[("old/one", b"1"), ("old/two", b"2")]);
    let ops = vec![
        Operation::moved("old/one", "one").unwrap(),
        Operation::moved("old/two", "two").unwrap(),
    ];

    let result = batch(&store, base, &ops);
    assert_eq!(result, sequential(&store, base, &ops));
    assert!(resolve(&store, result, "old").is_none());
    assert_eq!(store.get_tree(result).unwrap().len(), 2);
}

#[test]
fn test_replace_directory_with_file() {
    let store = MemoryObjectStore::new();
    let base = project(&store);
    let blob = store.put_blob(b"now a file").unwrap();
    let ops = vec![Operation::insert("docs", blob).unwrap()];

    let result = batch(&store, base, &ops);
    assert_eq!(result, sequential(&store, base, &ops));
    let docs = resolve(&store, result, "docs").unwrap();
    assert_eq!(docs.mode, EntryMode::Blob);
}

#[test]
fn test_replace_file_with_directory_then_move_it() {
    let store = MemoryObjectStore::new();
    let base = project(&store);
    let blob = store.put_blob(b"manifest").unwrap();
    let ops = vec![
        Operation::insert("Cargo.toml/inner", blob).unwrap(),
        Operation::moved("Cargo.toml", "manifest").unwrap(),
    ];

    let result = batch(&store, base, &ops);
    assert_eq!(result, sequential(&store, base, &ops));
    assert!(resolve(&store, result, "Cargo.toml").is_none());
    assert_eq!(resolve(&store, result, "manifest/inner").unwrap().id, blob);
}

#[test]
fn test_write_beneath_file_written_in_batch_collides() {
    let store = MemoryObjectStore::new();
    let base = project(&store);
    let blob = store.put_blob(b"x").unwrap();
    let ops = vec![
        Operation::insert("notes", blob).unwrap(),
        Operation::insert("notes/today.md", blob).unwrap(),
    ];

    let nested = simplify(&store, base, &ops).unwrap().changes.nest();
    assert!(matches!(nested, Err(EditError::PathCollision { .. })));
}

#[test]
fn test_batch_is_deterministic() {
    let store = MemoryObjectStore::new();
    let base = project(&store);
    let blob = store.put_blob(b"x").unwrap();
    let ops = vec![
        Operation::insert("z/last.txt", blob).unwrap(),
        Operation::insert("a/first.txt", blob).unwrap(),
        Operation::moved("docs", "a/docs").unwrap(),
    ];

    assert_eq!(batch(&store, base, &ops), batch(&store, base, &ops));
}
