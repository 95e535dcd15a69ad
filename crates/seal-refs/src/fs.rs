//! JSON file-backed reference store.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{RefError, Result};
use crate::memory::{check_delete, check_write};
use crate::traits::RefStore;
use crate::types::{Ref, HEAD};

/// All refs of a repository in one JSON document.
///
/// Every mutation rewrites the whole file through a temporary file in the
/// same directory followed by an atomic rename. Read-modify-write cycles
/// hold an exclusive advisory lock on `<path>.lock`, which serializes
/// writers across handles and processes. Readers take no lock; the rename
/// means they always see a complete file.
#[derive(Debug)]
pub struct FileRefStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileRefStore {
    /// Open the ref file at `path`. The file is created on first write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut lock_path = path.clone().into_os_string();
        lock_path.push(".lock");
        Ok(Self {
            path,
            lock_path: PathBuf::from(lock_path),
        })
    }

    /// Block until this handle is the only writer. The lock is released
    /// when the returned file is dropped.
    fn lock(&self) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        file.lock_exclusive()?;
        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, Ref>> {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| RefError::Serialization(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, refs: &BTreeMap<String, Ref>) -> Result<()> {
        let json = serde_json::to_vec_pretty(refs)
            .map_err(|e| RefError::Serialization(e.to_string()))?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| RefError::Io(e.error))?;
        Ok(())
    }
}

impl RefStore for FileRefStore {
    fn read_ref(&self, name: &str) -> Result<Option<Ref>> {
        Ok(self.load()?.remove(name))
    }

    fn write_ref(&self, name: &str, reference: &Ref) -> Result<()> {
        let _lock = self.lock()?;
        let mut refs = self.load()?;
        check_write(name, refs.get(name))?;
        refs.insert(name.to_string(), reference.clone());
        self.save(&refs)?;
        debug!(ref_name = name, target = %reference, "ref updated");
        Ok(())
    }

    fn delete_ref(&self, name: &str) -> Result<bool> {
        let _lock = self.lock()?;
        let mut refs = self.load()?;
        check_delete(name, refs.get(HEAD))?;
        if refs.remove(name).is_none() {
            return Ok(false);
        }
        self.save(&refs)?;
        Ok(true)
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, Ref)>> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|(k, _)| k.as_str() != HEAD && k.starts_with(prefix))
            .collect())
    }
}
