use seal_notes::{NoteEntry, NoteStore, NotesNamespace};
use seal_types::ObjectId;
use tracing::debug;

use crate::error::SealResult;

/// A note store pinned to one namespace.
///
/// Signer and verifier only ever see signatures through this adapter, so
/// neither can read or write notes outside the namespace it was built with.
pub struct AnnotationBridge<'a> {
    notes: &'a dyn NoteStore,
    namespace: NotesNamespace,
}

impl<'a> AnnotationBridge<'a> {
    pub fn new(notes: &'a dyn NoteStore, namespace: NotesNamespace) -> Self {
        Self { notes, namespace }
    }

    /// Bridge over the reserved signature namespace.
    pub fn signatures(notes: &'a dyn NoteStore) -> Self {
        Self::new(notes, NotesNamespace::signatures())
    }

    pub fn namespace(&self) -> &NotesNamespace {
        &self.namespace
    }

    /// Attach `blob` to `target`, replacing any earlier note. Returns the
    /// replaced blob.
    pub fn attach(&self, target: &ObjectId, blob: &ObjectId) -> SealResult<Option<ObjectId>> {
        let previous = self.notes.put(&self.namespace, target, blob)?;
        if let Some(previous) = previous {
            debug!(
                namespace = %self.namespace,
                target = %target.short_hex(),
                previous = %previous.short_hex(),
                "replaced existing note"
            );
        }
        Ok(previous)
    }

    pub fn lookup(&self, target: &ObjectId) -> SealResult<Option<ObjectId>> {
        Ok(self.notes.get(&self.namespace, target)?)
    }

    pub fn list(&self) -> SealResult<Vec<NoteEntry>> {
        Ok(self.notes.list(&self.namespace)?)
    }
}
