use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use seal_types::ObjectId;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// Filesystem object store.
///
/// Layout: `<root>/<first 2 hex chars>/<remaining 62 hex chars>`, each file a
/// bincode-encoded [`StoredObject`]. Files are written to a temporary file in
/// the same directory and renamed into place, so a reader never observes a
/// partial object. Every read re-hashes the content and rejects mismatches.
#[derive(Debug)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open (creating if needed) an object directory.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        let (dir, file) = hex.split_at(2);
        self.root.join(dir).join(file)
    }
}

impl ObjectStore for FsObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let path = self.path_for(id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let object: StoredObject =
            bincode::deserialize(&bytes).map_err(|e| StoreError::CorruptObject {
                id: *id,
                reason: e.to_string(),
            })?;
        let computed = object.compute_id();
        if computed != *id {
            return Err(StoreError::HashMismatch { id: *id, computed });
        }
        Ok(Some(object))
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        let path = self.path_for(&id);
        if path.exists() {
            return Ok(id);
        }
        let dir = path
            .parent()
            .ok_or_else(|| StoreError::Serialization("object path has no parent".into()))?;
        fs::create_dir_all(dir)?;

        let bytes =
            bincode::serialize(object).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;

        debug!(id = %id.short_hex(), kind = %object.kind, size = object.size, "object written");
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.path_for(id).is_file())
    }

    fn delete(&self, id: &ObjectId) -> StoreResult<bool> {
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Blob, ObjectKind};

    #[test]
    fn write_read_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::open(dir.path().join("objects")).unwrap();
        let obj = Blob::new(b"persisted".to_vec()).to_stored_object();
        let id = store.write(&obj).unwrap();

        let reopened = FsObjectStore::open(dir.path().join("objects")).unwrap();
        assert_eq!(reopened.read(&id).unwrap().unwrap(), obj);
        assert_eq!(
            reopened.type_and_size(&id).unwrap(),
            Some((ObjectKind::Blob, 9))
        );
    }

    #[test]
    fn fan_out_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();
        let id = store.write(&Blob::new(b"x".to_vec()).to_stored_object()).unwrap();
        let hex = id.to_hex();
        assert!(dir.path().join(&hex[..2]).join(&hex[2..]).is_file());
    }

    #[test]
    fn missing_object_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();
        assert!(store.read(&ObjectId::from_bytes(b"absent")).unwrap().is_none());
        assert!(!store.delete(&ObjectId::from_bytes(b"absent")).unwrap());
    }

    #[test]
    fn swapped_file_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();
        let a = store.write(&Blob::new(b"a".to_vec()).to_stored_object()).unwrap();
        let b = store.write(&Blob::new(b"b".to_vec()).to_stored_object()).unwrap();
        fs::copy(store.path_for(&b), store.path_for(&a)).unwrap();
        let err = store.read(&a).unwrap_err();
        assert!(matches!(err, StoreError::HashMismatch { .. }));
        assert!(err.is_integrity_failure());
        // Presence is a filesystem fact and survives the damage.
        assert!(store.exists(&a).unwrap());
    }

    #[test]
    fn garbage_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();
        let id = store.write(&Blob::new(b"a".to_vec()).to_stored_object()).unwrap();
        fs::write(store.path_for(&id), b"\xff").unwrap();
        assert!(store.read(&id).unwrap_err().is_integrity_failure());
    }
}
