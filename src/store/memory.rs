//! In-process object store

use crate::error::StorageError;
use crate::store::object::Object;
use crate::store::ObjectStore;
use crate::types::ObjectId;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Object store held entirely in memory
///
/// Used for bare sessions that never touch disk and throughout the tests.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, Object>>,
    refs: RwLock<HashMap<String, ObjectId>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get_object(&self, id: &ObjectId) -> Result<Option<Object>, StorageError> {
        Ok(self.objects.read().get(id).cloned())
    }

    fn put_object(&self, object: &Object) -> Result<ObjectId, StorageError> {
        let id = object.id();
        self.objects
            .write()
            .entry(id)
            .or_insert_with(|| object.clone());
        Ok(id)
    }

    fn read_ref(&self, name: &str) -> Result<Option<ObjectId>, StorageError> {
        Ok(self.refs.read().get(name).copied())
    }

    fn update_ref(
        &self,
        name: &str,
        expected: Option<ObjectId>,
        new: ObjectId,
    ) -> Result<(), StorageError> {
        let mut refs = self.refs.write();
        let actual = refs.get(name).copied();
        if actual != expected {
            return Err(StorageError::RefConflict {
                name: name.to_string(),
                expected,
                actual,
            });
        }
        refs.insert(name.to_string(), new);
        Ok(())
    }
}
