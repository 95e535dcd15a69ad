use std::collections::HashMap;
use std::sync::RwLock;

use seal_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. Objects are cloned on read and write.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted list of all object ids.
    pub fn all_ids(&self) -> StoreResult<Vec<ObjectId>> {
        let map = self.objects.read().map_err(|_| StoreError::Poisoned)?;
        let mut ids: Vec<ObjectId> = map.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let map = self.objects.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        let mut map = self.objects.write().map_err(|_| StoreError::Poisoned)?;
        map.entry(id).or_insert_with(|| object.clone());
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.objects.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.contains_key(id))
    }

    fn delete(&self, id: &ObjectId) -> StoreResult<bool> {
        let mut map = self.objects.write().map_err(|_| StoreError::Poisoned)?;
        Ok(map.remove(id).is_some())
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Blob, ObjectKind};

    #[test]
    fn write_and_read_blob() {
        let store = InMemoryObjectStore::new();
        let obj = Blob::new(b"hello world".to_vec()).to_stored_object();
        let id = store.write(&obj).unwrap();
        assert_eq!(store.read(&id).unwrap().unwrap(), obj);
    }

    #[test]
    fn write_is_idempotent() {
        let store = InMemoryObjectStore::new();
        let obj = Blob::new(b"same".to_vec()).to_stored_object();
        let id1 = store.write(&obj).unwrap();
        let id2 = store.write(&obj).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn read_missing_is_none() {
        let store = InMemoryObjectStore::new();
        assert!(store.read(&ObjectId::from_bytes(b"nope")).unwrap().is_none());
        assert!(store.type_and_size(&ObjectId::null()).unwrap().is_none());
    }

    #[test]
    fn type_and_size_reports_kind() {
        let store = InMemoryObjectStore::new();
        let id = store
            .write(&Blob::new(b"12345".to_vec()).to_stored_object())
            .unwrap();
        assert_eq!(
            store.type_and_size(&id).unwrap(),
            Some((ObjectKind::Blob, 5))
        );
    }

    #[test]
    fn delete_removes() {
        let store = InMemoryObjectStore::new();
        let id = store.write(&Blob::new(b"x".to_vec()).to_stored_object()).unwrap();
        assert!(store.delete(&id).unwrap());
        assert!(!store.exists(&id).unwrap());
        assert!(!store.delete(&id).unwrap());
    }

    #[test]
    fn all_ids_sorted() {
        let store = InMemoryObjectStore::new();
        for data in [b"a", b"b", b"c"] {
            store.write(&Blob::new(data.to_vec()).to_stored_object()).unwrap();
        }
        let ids = store.all_ids().unwrap();
        assert_eq!(ids.len(), 3);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }
}
