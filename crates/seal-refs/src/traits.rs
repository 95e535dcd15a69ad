//! The [`RefStore`] trait defining the reference storage interface.

use seal_types::ObjectId;

use crate::error::Result;
use crate::types::{branch_ref, Ref, HEADS_PREFIX, HEAD, TAGS_PREFIX};

/// Storage backend for named references.
///
/// Implementations must be thread-safe (`Send + Sync`) and provide atomic
/// read/write/delete operations on named refs. Names are canonical:
///
/// - `HEAD`
/// - `refs/heads/*` for branches
/// - `refs/tags/*` for tags (immutable once written)
pub trait RefStore: Send + Sync {
    /// Read a ref by its canonical name (e.g. "refs/heads/main").
    ///
    /// Returns `Ok(None)` if the ref does not exist.
    fn read_ref(&self, name: &str) -> Result<Option<Ref>>;

    /// Create or update a ref. Fails with `TagImmutable` when overwriting an
    /// existing tag; delete it first to move it.
    fn write_ref(&self, name: &str, reference: &Ref) -> Result<()>;

    /// Delete a ref by canonical name.
    ///
    /// Returns `Ok(true)` if the ref existed and was deleted, `Ok(false)` if
    /// it did not exist.
    fn delete_ref(&self, name: &str) -> Result<bool>;

    /// All refs whose canonical name starts with `prefix`, sorted by name.
    /// `HEAD` is never listed.
    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, Ref)>>;

    /// Read HEAD. Returns `Ok(None)` if HEAD has not been set.
    fn head(&self) -> Result<Option<Ref>> {
        self.read_ref(HEAD)
    }

    /// Point HEAD at a branch.
    fn set_head(&self, branch: &str) -> Result<()> {
        crate::names::validate_branch_name(branch)?;
        self.write_ref(HEAD, &Ref::Symbolic(branch_ref(branch)))
    }

    /// Detach HEAD onto an object.
    fn set_head_detached(&self, id: ObjectId) -> Result<()> {
        self.write_ref(HEAD, &Ref::Direct(id))
    }

    fn branches(&self) -> Result<Vec<(String, Ref)>> {
        self.list_refs(HEADS_PREFIX)
    }

    fn tags(&self) -> Result<Vec<(String, Ref)>> {
        self.list_refs(TAGS_PREFIX)
    }
}
