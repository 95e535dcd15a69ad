use std::fmt;

use seal_crypto::ContentHasher;
use seal_types::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Raw content (file contents, signature envelopes).
    Blob,
    /// Directory listing mapping names to object ids.
    Tree,
    /// Snapshot: a tree, its parents, authorship and a message.
    Commit,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blob => write!(f, "blob"),
            Self::Tree => write!(f, "tree"),
            Self::Commit => write!(f, "commit"),
        }
    }
}

/// The unit of storage: kind tag + stored encoding + cached size.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub data: Vec<u8>,
    pub size: u64,
}

impl StoredObject {
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Content-addressed id, hashed under the kind's domain.
    pub fn compute_id(&self) -> ObjectId {
        let hasher = match self.kind {
            ObjectKind::Blob => &ContentHasher::BLOB,
            ObjectKind::Tree => &ContentHasher::TREE,
            ObjectKind::Commit => &ContentHasher::COMMIT,
        };
        hasher.hash(&self.data)
    }

    /// The canonical bytes a signature over this object covers.
    ///
    /// Blobs are their raw bytes. Trees and commits render to their pretty
    /// text form, which is independent of the stored JSON encoding.
    pub fn canonical_content(&self) -> StoreResult<Vec<u8>> {
        match self.kind {
            ObjectKind::Blob => Ok(self.data.clone()),
            ObjectKind::Tree => Ok(Tree::from_stored_object(self)?.pretty().into_bytes()),
            ObjectKind::Commit => Ok(Commit::from_stored_object(self)?.pretty().into_bytes()),
        }
    }

    fn expect_kind(&self, kind: ObjectKind) -> StoreResult<()> {
        if self.kind != kind {
            return Err(StoreError::CorruptObject {
                id: self.compute_id(),
                reason: format!("expected {kind}, got {}", self.kind),
            });
        }
        Ok(())
    }

    fn decode_json<T: for<'de> Deserialize<'de>>(&self) -> StoreResult<T> {
        serde_json::from_slice(&self.data).map_err(|e| StoreError::CorruptObject {
            id: self.compute_id(),
            reason: e.to_string(),
        })
    }
}

fn encode_json<T: Serialize>(kind: ObjectKind, value: &T) -> StoreResult<StoredObject> {
    let data = serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(StoredObject::new(kind, data))
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Blob)?;
        Ok(Self {
            data: obj.data.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// File mode for a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    Regular,
    Executable,
    Symlink,
    Directory,
}

impl EntryMode {
    pub fn mode_bits(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Directory => 0o040000,
        }
    }

    /// Kind of object an entry with this mode points at.
    pub fn object_kind(&self) -> ObjectKind {
        match self {
            Self::Directory => ObjectKind::Tree,
            _ => ObjectKind::Blob,
        }
    }
}

impl fmt::Display for EntryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06o}", self.mode_bits())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub mode: EntryMode,
    pub name: String,
    pub object_id: ObjectId,
}

impl TreeEntry {
    pub fn new(mode: EntryMode, name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            mode,
            name: name.into(),
            object_id,
        }
    }
}

/// Directory listing, entries sorted by name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode_json(ObjectKind::Tree, self)
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Tree)?;
        obj.decode_json()
    }

    /// One line per entry: `<mode> <kind> <hex>\t<name>`.
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&format!(
                "{} {} {}\t{}\n",
                entry.mode,
                entry.mode.object_kind(),
                entry.object_id,
                entry.name
            ));
        }
        out
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// Author or committer line of a commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub email: String,
    /// Seconds since the Unix epoch.
    pub time: i64,
    /// Offset from UTC in minutes.
    pub tz_offset_minutes: i32,
}

impl Person {
    /// Fails if `name` or `email` contains characters that would make the
    /// canonical text ambiguous (`<`, `>`, newlines).
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        time: i64,
        tz_offset_minutes: i32,
    ) -> StoreResult<Self> {
        let name = name.into();
        let email = email.into();
        for field in [&name, &email] {
            if field.contains(['<', '>', '\n', '\r']) {
                return Err(StoreError::InvalidIdentity(field.clone()));
            }
        }
        Ok(Self {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            time,
            tz_offset_minutes,
        })
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.tz_offset_minutes < 0 { '-' } else { '+' };
        let offset = self.tz_offset_minutes.unsigned_abs();
        write!(
            f,
            "{} <{}> {} {}{:02}{:02}",
            self.name,
            self.email,
            self.time,
            sign,
            offset / 60,
            offset % 60
        )
    }
}

/// A snapshot in history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub author: Person,
    pub committer: Person,
    pub message: String,
}

impl Commit {
    /// Build a commit. The message is normalized to LF line endings with
    /// exactly one trailing newline, so the pretty form is reproducible on
    /// any host.
    pub fn new(
        tree: ObjectId,
        parents: Vec<ObjectId>,
        author: Person,
        committer: Person,
        message: &str,
    ) -> Self {
        let mut message = message.replace("\r\n", "\n").trim_end_matches('\n').to_string();
        message.push('\n');
        Self {
            tree,
            parents,
            author,
            committer,
            message,
        }
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode_json(ObjectKind::Commit, self)
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Commit)?;
        obj.decode_json()
    }

    /// Canonical text form:
    ///
    /// ```text
    /// tree <hex>
    /// parent <hex>
    /// author <name> <<email>> <time> <+hhmm>
    /// committer <name> <<email>> <time> <+hhmm>
    ///
    /// <message>
    /// ```
    pub fn pretty(&self) -> String {
        let mut out = format!("tree {}\n", self.tree);
        for parent in &self.parents {
            out.push_str(&format!("parent {parent}\n"));
        }
        out.push_str(&format!("author {}\n", self.author));
        out.push_str(&format!("committer {}\n", self.committer));
        out.push('\n');
        out.push_str(&self.message);
        out
    }

    /// First line of the message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}
