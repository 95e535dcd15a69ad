use std::collections::BTreeMap;
use std::sync::RwLock;

use seal_types::ObjectId;

use crate::error::{NoteError, NoteResult};
use crate::namespace::NotesNamespace;
use crate::traits::{NoteEntry, NoteStore};

type Notes = BTreeMap<ObjectId, ObjectId>;

/// In-memory note store.
#[derive(Debug, Default)]
pub struct InMemoryNoteStore {
    namespaces: RwLock<BTreeMap<NotesNamespace, Notes>>,
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NoteStore for InMemoryNoteStore {
    fn put(
        &self,
        namespace: &NotesNamespace,
        target: &ObjectId,
        blob: &ObjectId,
    ) -> NoteResult<Option<ObjectId>> {
        let mut map = self.namespaces.write().map_err(|_| NoteError::Poisoned)?;
        Ok(map.entry(namespace.clone()).or_default().insert(*target, *blob))
    }

    fn get(&self, namespace: &NotesNamespace, target: &ObjectId) -> NoteResult<Option<ObjectId>> {
        let map = self.namespaces.read().map_err(|_| NoteError::Poisoned)?;
        Ok(map.get(namespace).and_then(|notes| notes.get(target)).copied())
    }

    fn list(&self, namespace: &NotesNamespace) -> NoteResult<Vec<NoteEntry>> {
        let map = self.namespaces.read().map_err(|_| NoteError::Poisoned)?;
        Ok(map
            .get(namespace)
            .map(|notes| {
                notes
                    .iter()
                    .map(|(target, blob)| NoteEntry {
                        namespace: namespace.clone(),
                        target: *target,
                        blob: *blob,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn remove_namespace(&self, namespace: &NotesNamespace) -> NoteResult<bool> {
        let mut map = self.namespaces.write().map_err(|_| NoteError::Poisoned)?;
        Ok(map.remove(namespace).is_some())
    }

    fn namespaces(&self) -> NoteResult<Vec<NotesNamespace>> {
        let map = self.namespaces.read().map_err(|_| NoteError::Poisoned)?;
        Ok(map
            .iter()
            .filter(|(_, notes)| !notes.is_empty())
            .map(|(ns, _)| ns.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(seed: &[u8]) -> ObjectId {
        ObjectId::from_bytes(seed)
    }

    #[test]
    fn put_then_get() {
        let store = InMemoryNoteStore::new();
        let ns = NotesNamespace::signatures();
        assert_eq!(store.put(&ns, &id(b"c"), &id(b"s")).unwrap(), None);
        assert_eq!(store.get(&ns, &id(b"c")).unwrap(), Some(id(b"s")));
        assert_eq!(store.get(&ns, &id(b"other")).unwrap(), None);
    }

    #[test]
    fn last_writer_wins() {
        let store = InMemoryNoteStore::new();
        let ns = NotesNamespace::signatures();
        store.put(&ns, &id(b"c"), &id(b"s1")).unwrap();
        let previous = store.put(&ns, &id(b"c"), &id(b"s2")).unwrap();
        assert_eq!(previous, Some(id(b"s1")));
        assert_eq!(store.get(&ns, &id(b"c")).unwrap(), Some(id(b"s2")));
        assert_eq!(store.list(&ns).unwrap().len(), 1);
    }

    #[test]
    fn namespaces_are_isolated() {
        let store = InMemoryNoteStore::new();
        let crypto = NotesNamespace::signatures();
        let review = NotesNamespace::new("review").unwrap();
        store.put(&review, &id(b"c"), &id(b"r")).unwrap();
        assert_eq!(store.get(&crypto, &id(b"c")).unwrap(), None);
        assert_eq!(store.namespaces().unwrap(), vec![review]);
    }

    #[test]
    fn remove_namespace_drops_all_entries() {
        let store = InMemoryNoteStore::new();
        let ns = NotesNamespace::signatures();
        store.put(&ns, &id(b"a"), &id(b"1")).unwrap();
        store.put(&ns, &id(b"b"), &id(b"2")).unwrap();
        assert!(store.remove_namespace(&ns).unwrap());
        assert!(store.list(&ns).unwrap().is_empty());
        assert!(!store.remove_namespace(&ns).unwrap());
    }
}
