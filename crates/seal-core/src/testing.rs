//! Shared fixtures for this crate's tests.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use seal_notes::InMemoryNoteStore;
use seal_refs::InMemoryRefStore;
use seal_store::{Blob, InMemoryObjectStore, ObjectStore, StoreError, StoreResult, StoredObject};
use seal_types::ObjectId;

use crate::bridge::AnnotationBridge;
use crate::signer::Signer;
use crate::verifier::Verifier;

/// Object store whose content can be swapped under an existing id, the way
/// a corrupted or maliciously edited repository would present it, or made
/// to fail its integrity check outright.
#[derive(Default)]
pub struct TamperableStore {
    inner: InMemoryObjectStore,
    overrides: RwLock<HashMap<ObjectId, StoredObject>>,
    damaged: RwLock<HashSet<ObjectId>>,
}

impl TamperableStore {
    pub fn replace(&self, id: &ObjectId, object: StoredObject) {
        self.overrides.write().unwrap().insert(*id, object);
    }

    /// Make reads of `id` fail the way a hash-checking store reports
    /// bytes edited on disk.
    pub fn corrupt(&self, id: &ObjectId) {
        self.damaged.write().unwrap().insert(*id);
    }
}

impl ObjectStore for TamperableStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        if self.damaged.read().unwrap().contains(id) {
            return Err(StoreError::HashMismatch {
                id: *id,
                computed: ObjectId::from_bytes(b"edited on disk"),
            });
        }
        if let Some(object) = self.overrides.read().unwrap().get(id) {
            return Ok(Some(object.clone()));
        }
        self.inner.read(id)
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        self.inner.write(object)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        self.inner.exists(id)
    }

    fn delete(&self, id: &ObjectId) -> StoreResult<bool> {
        self.inner.delete(id)
    }
}

#[derive(Default)]
pub struct Fixture {
    pub objects: TamperableStore,
    pub refs: InMemoryRefStore,
    pub notes: InMemoryNoteStore,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blob(&self, data: &[u8]) -> ObjectId {
        self.objects
            .write(&Blob::new(data.to_vec()).to_stored_object())
            .unwrap()
    }

    pub fn bridge(&self) -> AnnotationBridge<'_> {
        AnnotationBridge::signatures(&self.notes)
    }

    pub fn signer(&self) -> Signer<'_> {
        Signer::new(&self.objects, &self.refs, self.bridge())
    }

    pub fn verifier(&self) -> Verifier<'_> {
        Verifier::new(&self.objects, self.bridge())
    }
}
