use seal_types::ObjectId;

use crate::error::NoteResult;
use crate::namespace::NotesNamespace;

/// One live note: `target` annotated with `blob` in `namespace`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteEntry {
    pub namespace: NotesNamespace,
    pub target: ObjectId,
    pub blob: ObjectId,
}

/// Namespaced mapping from annotated object to annotation blob.
///
/// There is at most one note per `(namespace, target)`; a later `put`
/// replaces the earlier one. The store records ids only and never reads
/// or validates the blobs it points at.
pub trait NoteStore: Send + Sync {
    /// Attach `blob` to `target`. Returns the blob this replaced, if any.
    fn put(
        &self,
        namespace: &NotesNamespace,
        target: &ObjectId,
        blob: &ObjectId,
    ) -> NoteResult<Option<ObjectId>>;

    fn get(&self, namespace: &NotesNamespace, target: &ObjectId) -> NoteResult<Option<ObjectId>>;

    /// All notes in a namespace, ordered by target.
    fn list(&self, namespace: &NotesNamespace) -> NoteResult<Vec<NoteEntry>>;

    /// Drop a namespace and every note in it. Returns `true` if it existed.
    fn remove_namespace(&self, namespace: &NotesNamespace) -> NoteResult<bool>;

    /// Namespaces holding at least one note, sorted.
    fn namespaces(&self) -> NoteResult<Vec<NotesNamespace>>;
}
