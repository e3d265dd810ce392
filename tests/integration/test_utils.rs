//! Shared test utilities for integration tests

use snaptree::session::PublishOutcome;
use snaptree::store::{ObjectStore, Signature};
use snaptree::tree::hasher::empty_tree_id;
use snaptree::tree::{editor, lookup, split, EntryMode, TreeEntry};
use snaptree::ObjectId;
use std::sync::Mutex;
use tempfile::TempDir;

/// Serializes access to XDG environment variables across parallel tests
static XDG_ENV_MUTEX: Mutex<()> = Mutex::new(());

pub fn author() -> Signature {
    Signature::at("Ada Lovelace", "ada@example.com", 1_700_000_000, 60)
}

/// Build a tree holding `files`, each blob containing its own contents
pub fn build_tree<S: ObjectStore>(store: &S, files: &[(&str, &[u8])]) -> ObjectId {
    let mut root = empty_tree_id();
    for (path, contents) in files {
        let blob = store.put_blob(contents).unwrap();
        root = editor::insert(store, root, &split(path).unwrap(), blob, EntryMode::Blob).unwrap();
    }
    root
}

pub fn resolve<S: ObjectStore>(store: &S, tree: ObjectId, path: &str) -> Option<TreeEntry> {
    lookup::resolve(store, tree, &split(path).unwrap()).unwrap()
}

/// (commit, tree) of a committed publish; panics on `Unchanged`
pub fn committed(outcome: PublishOutcome) -> (ObjectId, ObjectId) {
    match outcome {
        PublishOutcome::Committed { commit, tree } => (commit, tree),
        PublishOutcome::Unchanged => panic!("expected a commit, publish was a no-op"),
    }
}

/// Run `f` with XDG_CONFIG_HOME pointed at an empty directory
///
/// Keeps a developer's global snaptree config out of config-loading tests.
pub fn with_isolated_config_home<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = XDG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let original = std::env::var("XDG_CONFIG_HOME").ok();

    let config_home = test_dir.path().join("xdg-config");
    std::fs::create_dir_all(&config_home).unwrap();
    std::env::set_var("XDG_CONFIG_HOME", &config_home);

    let result = f();

    match original {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }
    result
}
