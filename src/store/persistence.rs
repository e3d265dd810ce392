//! Persistence layer for the object store

use crate::error::StorageError;
use crate::store::object::Object;
use crate::store::ObjectStore;
use crate::types::ObjectId;
use bincode;
use sled;
use std::path::Path;
use tracing::{debug, warn};

const REF_PREFIX: &str = "ref:";

/// Sled-based implementation of ObjectStore
///
/// Objects are keyed by their 32-byte identity and stored bincode-encoded.
/// References live under `ref:<name>` and hold the raw 32 target bytes.
pub struct SledObjectStore {
    db: sled::Db,
}

impl SledObjectStore {
    /// Open (or create) a store at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)
            .map_err(|e| StorageError::other("Failed to open sled database", e))?;
        Ok(Self { db })
    }

    /// Get the underlying sled database (for advanced operations)
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    /// Check if an object exists in the store
    pub fn contains(&self, id: &ObjectId) -> Result<bool, StorageError> {
        self.db
            .contains_key(id.as_bytes())
            .map_err(|e| StorageError::other("Failed to check object existence", e))
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db
            .flush()
            .map_err(|e| StorageError::other("Failed to flush database", e))?;
        Ok(())
    }

    fn ref_key(name: &str) -> Vec<u8> {
        format!("{}{}", REF_PREFIX, name).into_bytes()
    }

    fn decode_ref(name: &str, bytes: &[u8]) -> Result<ObjectId, StorageError> {
        if bytes.len() != 32 {
            return Err(StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Invalid target length for reference {}", name),
            )));
        }
        let mut raw = [0u8; 32];
        raw.copy_from_slice(bytes);
        Ok(ObjectId::from_bytes(raw))
    }
}

impl ObjectStore for SledObjectStore {
    fn get_object(&self, id: &ObjectId) -> Result<Option<Object>, StorageError> {
        let value = match self
            .db
            .get(id.as_bytes())
            .map_err(|e| StorageError::other("Failed to get object", e))?
        {
            Some(value) => value,
            None => return Ok(None),
        };

        let object: Object = bincode::deserialize(&value).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Failed to deserialize object {}: {}", id, e),
            ))
        })?;

        // Verify identity matches (corruption detection)
        let actual = object.id();
        if actual != *id {
            warn!(expected = %id, actual = %actual, "Stored object failed verification");
            return Err(StorageError::HashMismatch {
                expected: *id,
                actual,
            });
        }

        Ok(Some(object))
    }

    fn put_object(&self, object: &Object) -> Result<ObjectId, StorageError> {
        let id = object.id();

        // Same identity means same content, skip the write
        if self.contains(&id)? {
            return Ok(id);
        }

        let value = bincode::serialize(object).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Failed to serialize {} object: {}", object.kind(), e),
            ))
        })?;

        self.db
            .insert(id.as_bytes(), value)
            .map_err(|e| StorageError::other("Failed to put object", e))?;

        debug!(id = %id.short(), kind = %object.kind(), "Stored object");
        Ok(id)
    }

    fn read_ref(&self, name: &str) -> Result<Option<ObjectId>, StorageError> {
        match self
            .db
            .get(Self::ref_key(name))
            .map_err(|e| StorageError::other("Failed to read reference", e))?
        {
            Some(bytes) => Ok(Some(Self::decode_ref(name, &bytes)?)),
            None => Ok(None),
        }
    }

    fn update_ref(
        &self,
        name: &str,
        expected: Option<ObjectId>,
        new: ObjectId,
    ) -> Result<(), StorageError> {
        let outcome = self
            .db
            .compare_and_swap(
                Self::ref_key(name),
                expected.map(|id| id.as_bytes().to_vec()),
                Some(new.as_bytes().to_vec()),
            )
            .map_err(|e| StorageError::other("Failed to update reference", e))?;

        match outcome {
            Ok(()) => {
                self.flush()?;
                Ok(())
            }
            Err(conflict) => {
                let actual = match conflict.current {
                    Some(bytes) => Some(Self::decode_ref(name, &bytes)?),
                    None => None,
                };
                Err(StorageError::RefConflict {
                    name: name.to_string(),
                    expected,
                    actual,
                })
            }
        }
    }
}
