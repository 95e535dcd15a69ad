use seal_types::ObjectId;

use crate::error::StoreResult;
use crate::object::{ObjectKind, StoredObject};

/// Content-addressed object store.
///
/// Implementations must satisfy these invariants:
/// - Objects are immutable once written; the same object always gets the
///   same id.
/// - Concurrent reads are always safe.
/// - The store never interprets object contents.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Read an object by id.
    ///
    /// Returns `Ok(None)` if the object does not exist and `Err` on I/O
    /// failure or data corruption.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its id. Writing an existing object is a
    /// no-op.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Delete an object. Returns `true` if it existed. Garbage collection
    /// only: deleting a referenced object corrupts the repository.
    fn delete(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Kind and size of an object without handing out its data.
    fn type_and_size(&self, id: &ObjectId) -> StoreResult<Option<(ObjectKind, u64)>> {
        Ok(self.read(id)?.map(|obj| (obj.kind, obj.size)))
    }
}
