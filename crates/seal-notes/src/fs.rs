use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use seal_types::ObjectId;
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{NoteError, NoteResult};
use crate::namespace::NotesNamespace;
use crate::traits::{NoteEntry, NoteStore};

/// Directory holding one namespace's notes. Name components never start
/// with `.`, so it cannot collide with a nested namespace.
const NOTES_DIR: &str = ".notes";

/// File-backed note store: one file per note.
///
/// `<root>/<namespace>/.notes/<2 hex>/<62 hex>` holds the blob id of the
/// note on the target with that id, fanned out like the object store. Each
/// file is written to a temporary file and renamed into place, so writers
/// for different targets never touch the same file and a race on one
/// target leaves the last writer's note. No lock is needed, within or
/// across processes.
#[derive(Debug)]
pub struct FileNoteStore {
    root: PathBuf,
}

impl FileNoteStore {
    pub fn open(root: impl AsRef<Path>) -> NoteResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn notes_dir(&self, namespace: &NotesNamespace) -> PathBuf {
        self.root.join(namespace.name()).join(NOTES_DIR)
    }

    fn note_path(&self, namespace: &NotesNamespace, target: &ObjectId) -> PathBuf {
        let hex = target.to_hex();
        let (dir, file) = hex.split_at(2);
        self.notes_dir(namespace).join(dir).join(file)
    }

    /// The blob id stored at `path`, `None` if there is no note.
    fn read_note(&self, namespace: &NotesNamespace, path: &Path) -> NoteResult<Option<ObjectId>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        ObjectId::from_hex(text.trim())
            .map(Some)
            .map_err(|e| NoteError::Corrupt {
                namespace: namespace.to_string(),
                reason: format!("{}: {e}", path.display()),
            })
    }

    fn namespace_at(&self, dir: &Path) -> Option<NotesNamespace> {
        let relative = dir.strip_prefix(&self.root).ok()?;
        let relative = relative.to_string_lossy().replace('\\', "/");
        NotesNamespace::new(relative).ok()
    }
}

/// Target id encoded in a `<2 hex>/<62 hex>` note path. Temporary files
/// and anything else that does not spell an id yield `None`.
fn target_at(path: &Path) -> Option<ObjectId> {
    let file = path.file_name()?.to_str()?;
    let dir = path.parent()?.file_name()?.to_str()?;
    if dir.len() != 2 || file.len() != 62 {
        return None;
    }
    ObjectId::from_hex(&format!("{dir}{file}")).ok()
}

impl NoteStore for FileNoteStore {
    fn put(
        &self,
        namespace: &NotesNamespace,
        target: &ObjectId,
        blob: &ObjectId,
    ) -> NoteResult<Option<ObjectId>> {
        let path = self.note_path(namespace, target);
        let previous = self.read_note(namespace, &path).unwrap_or_else(|e| {
            warn!(namespace = %namespace, target = %target.short_hex(), error = %e, "overwriting unreadable note");
            None
        });

        let dir = path
            .parent()
            .ok_or_else(|| NoteError::Serialization("note path has no parent".into()))?;
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        writeln!(tmp, "{}", blob.to_hex())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| NoteError::Io(e.error))?;

        debug!(namespace = %namespace, target = %target.short_hex(), "note written");
        Ok(previous)
    }

    fn get(&self, namespace: &NotesNamespace, target: &ObjectId) -> NoteResult<Option<ObjectId>> {
        self.read_note(namespace, &self.note_path(namespace, target))
    }

    fn list(&self, namespace: &NotesNamespace) -> NoteResult<Vec<NoteEntry>> {
        let dir = self.notes_dir(namespace);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(2).max_depth(2) {
            let entry = entry.map_err(|e| NoteError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(target) = target_at(entry.path()) else {
                continue;
            };
            // A note removed since the directory was read is simply gone.
            if let Some(blob) = self.read_note(namespace, entry.path())? {
                out.push(NoteEntry {
                    namespace: namespace.clone(),
                    target,
                    blob,
                });
            }
        }
        out.sort_by_key(|entry| entry.target);
        Ok(out)
    }

    fn remove_namespace(&self, namespace: &NotesNamespace) -> NoteResult<bool> {
        match fs::remove_dir_all(self.notes_dir(namespace)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn namespaces(&self) -> NoteResult<Vec<NotesNamespace>> {
        let mut out = Vec::new();
        let mut walk = WalkDir::new(&self.root).min_depth(1).into_iter();
        while let Some(entry) = walk.next() {
            let entry = entry.map_err(|e| NoteError::Io(e.into()))?;
            if !entry.file_type().is_dir() || entry.file_name() != NOTES_DIR {
                continue;
            }
            if let Some(ns) = entry.path().parent().and_then(|dir| self.namespace_at(dir)) {
                out.push(ns);
            }
            walk.skip_current_dir();
        }
        out.sort();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(seed: &[u8]) -> ObjectId {
        ObjectId::from_bytes(seed)
    }

    #[test]
    fn notes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let ns = NotesNamespace::signatures();
        FileNoteStore::open(dir.path())
            .unwrap()
            .put(&ns, &id(b"c"), &id(b"s"))
            .unwrap();
        let store = FileNoteStore::open(dir.path()).unwrap();
        assert_eq!(store.get(&ns, &id(b"c")).unwrap(), Some(id(b"s")));
        let hex = id(b"c").to_hex();
        let path = dir.path().join("crypto/.notes").join(&hex[..2]).join(&hex[2..]);
        assert_eq!(fs::read_to_string(path).unwrap().trim(), id(b"s").to_hex());
    }

    #[test]
    fn nested_namespaces_listed() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileNoteStore::open(dir.path()).unwrap();
        let ci = NotesNamespace::new("team/ci").unwrap();
        store.put(&NotesNamespace::signatures(), &id(b"a"), &id(b"1")).unwrap();
        store.put(&ci, &id(b"a"), &id(b"2")).unwrap();
        assert_eq!(
            store.namespaces().unwrap(),
            vec![NotesNamespace::signatures(), ci]
        );
    }

    #[test]
    fn overwrite_returns_previous() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileNoteStore::open(dir.path()).unwrap();
        let ns = NotesNamespace::signatures();
        store.put(&ns, &id(b"c"), &id(b"1")).unwrap();
        assert_eq!(store.put(&ns, &id(b"c"), &id(b"2")).unwrap(), Some(id(b"1")));
        assert_eq!(store.list(&ns).unwrap().len(), 1);
    }

    #[test]
    fn remove_namespace_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileNoteStore::open(dir.path()).unwrap();
        let ns = NotesNamespace::signatures();
        store.put(&ns, &id(b"c"), &id(b"1")).unwrap();
        assert!(store.remove_namespace(&ns).unwrap());
        assert_eq!(store.get(&ns, &id(b"c")).unwrap(), None);
        assert!(store.namespaces().unwrap().is_empty());
    }

    #[test]
    fn corrupt_note_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileNoteStore::open(dir.path()).unwrap();
        let ns = NotesNamespace::signatures();
        store.put(&ns, &id(b"c"), &id(b"1")).unwrap();
        fs::write(store.note_path(&ns, &id(b"c")), b"zz").unwrap();
        assert!(matches!(
            store.get(&ns, &id(b"c")),
            Err(NoteError::Corrupt { .. })
        ));
        // A fresh write replaces the damaged note.
        assert_eq!(store.put(&ns, &id(b"c"), &id(b"2")).unwrap(), None);
        assert_eq!(store.get(&ns, &id(b"c")).unwrap(), Some(id(b"2")));
    }

    #[test]
    fn stray_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileNoteStore::open(dir.path()).unwrap();
        let ns = NotesNamespace::signatures();
        store.put(&ns, &id(b"c"), &id(b"1")).unwrap();
        let hex = id(b"c").to_hex();
        fs::write(store.notes_dir(&ns).join(&hex[..2]).join(".tmpAbC123"), b"x").unwrap();
        assert_eq!(store.list(&ns).unwrap().len(), 1);
    }

    #[test]
    fn removing_parent_namespace_keeps_nested_one() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileNoteStore::open(dir.path()).unwrap();
        let team = NotesNamespace::new("team").unwrap();
        let ci = NotesNamespace::new("team/ci").unwrap();
        store.put(&team, &id(b"a"), &id(b"1")).unwrap();
        store.put(&ci, &id(b"a"), &id(b"2")).unwrap();
        assert!(store.remove_namespace(&team).unwrap());
        assert_eq!(store.namespaces().unwrap(), vec![ci.clone()]);
        assert_eq!(store.get(&ci, &id(b"a")).unwrap(), Some(id(b"2")));
    }

    #[test]
    fn parallel_handles_keep_every_note() {
        let dir = tempfile::tempdir().unwrap();
        let ns = NotesNamespace::signatures();
        let first = FileNoteStore::open(dir.path()).unwrap();
        let second = FileNoteStore::open(dir.path()).unwrap();

        std::thread::scope(|scope| {
            for (tag, store) in [(b'a', &first), (b'b', &second)] {
                let ns = &ns;
                scope.spawn(move || {
                    for i in 0..200u32 {
                        let mut seed = vec![tag];
                        seed.extend_from_slice(&i.to_le_bytes());
                        store.put(ns, &id(&seed), &id(b"sig")).unwrap();
                    }
                });
            }
        });

        assert_eq!(first.list(&ns).unwrap().len(), 400);
        assert_eq!(second.list(&ns).unwrap().len(), 400);
    }
}
