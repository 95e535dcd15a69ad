use std::collections::{HashSet, VecDeque};

use seal_types::ObjectId;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::object::{Commit, ObjectKind};
use crate::traits::ObjectStore;

/// Breadth-first walk over commit ancestry.
pub struct HistoryWalk;

/// Result of [`HistoryWalk::collect`].
#[derive(Debug, Default)]
pub struct Walk {
    /// Every commit id reached, readable or not, in breadth-first order.
    pub visited: Vec<ObjectId>,
    /// Reached ids that could not be read as commits. Their parents are
    /// unknown, so history behind them is only covered through other paths.
    pub unreadable: Vec<(ObjectId, StoreError)>,
}

impl HistoryWalk {
    /// All commits reachable from `tips`, each exactly once, in
    /// breadth-first order starting with the tips themselves.
    ///
    /// Tips that are not commits (e.g. a ref to a blob) are skipped. A
    /// missing or damaged commit is an error.
    pub fn from_tips(store: &dyn ObjectStore, tips: &[ObjectId]) -> StoreResult<Vec<ObjectId>> {
        Ok(Self::walk(store, tips, false)?.visited)
    }

    /// Like [`from_tips`](Self::from_tips), but a commit that is missing or
    /// fails its integrity check is recorded in [`Walk::unreadable`] and the
    /// walk goes on. Backend failures (I/O, poisoned locks) still abort.
    pub fn collect(store: &dyn ObjectStore, tips: &[ObjectId]) -> StoreResult<Walk> {
        Self::walk(store, tips, true)
    }

    fn walk(store: &dyn ObjectStore, tips: &[ObjectId], tolerant: bool) -> StoreResult<Walk> {
        let mut seen: HashSet<ObjectId> = HashSet::new();
        let mut queue: VecDeque<ObjectId> = VecDeque::new();
        let mut walk = Walk::default();

        for tip in tips {
            if seen.insert(*tip) {
                queue.push_back(*tip);
            }
        }

        while let Some(id) = queue.pop_front() {
            let commit = match read_commit(store, &id) {
                Ok(Some(commit)) => commit,
                Ok(None) => continue,
                Err(e) if tolerant && (e.is_integrity_failure() || matches!(e, StoreError::NotFound(_))) => {
                    warn!(id = %id.short_hex(), error = %e, "unreadable commit in history");
                    walk.visited.push(id);
                    walk.unreadable.push((id, e));
                    continue;
                }
                Err(e) => return Err(e),
            };
            walk.visited.push(id);
            for parent in commit.parents {
                if seen.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }

        debug!(
            tips = tips.len(),
            commits = walk.visited.len(),
            unreadable = walk.unreadable.len(),
            "history walk complete"
        );
        Ok(walk)
    }
}

fn read_commit(store: &dyn ObjectStore, id: &ObjectId) -> StoreResult<Option<Commit>> {
    let object = store.read(id)?.ok_or(StoreError::NotFound(*id))?;
    if object.kind != ObjectKind::Commit {
        debug!(id = %id.short_hex(), kind = %object.kind, "skipping non-commit tip");
        return Ok(None);
    }
    Commit::from_stored_object(&object).map(Some)
}
