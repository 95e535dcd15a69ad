//! Resolution of user-supplied revision strings to object ids.

use seal_store::ObjectStore;
use seal_types::ObjectId;

use crate::error::{RefError, Result};
use crate::traits::RefStore;
use crate::types::{branch_ref, tag_ref, Ref, HEAD};

/// Maximum number of symbolic hops followed before giving up.
pub const MAX_SYMBOLIC_DEPTH: usize = 5;

/// Follow `name` through symbolic refs to an object id.
///
/// Returns `Ok(None)` if the ref, or the ref it points at, does not exist
/// (an unborn branch).
pub fn peel(refs: &dyn RefStore, name: &str) -> Result<Option<ObjectId>> {
    let mut current = name.to_string();
    for _ in 0..=MAX_SYMBOLIC_DEPTH {
        match refs.read_ref(&current)? {
            None => return Ok(None),
            Some(Ref::Direct(id)) => return Ok(Some(id)),
            Some(Ref::Symbolic(next)) => current = next,
        }
    }
    Err(RefError::SymbolicDepth {
        name: name.to_string(),
    })
}

/// Resolve a revision string to an object id.
///
/// Accepted forms, tried in order:
/// 1. `HEAD`
/// 2. a full canonical name (`refs/...`)
/// 3. a full 64-character hex object id that exists in `store`
/// 4. a short branch name (`refs/heads/<rev>`)
/// 5. a short tag name (`refs/tags/<rev>`)
pub fn resolve(refs: &dyn RefStore, store: &dyn ObjectStore, rev: &str) -> Result<ObjectId> {
    let unresolvable = || RefError::Unresolvable(rev.to_string());

    if rev == HEAD || rev.starts_with("refs/") {
        return peel(refs, rev)?.ok_or_else(unresolvable);
    }

    if ObjectId::is_hex_id(rev) {
        if let Ok(id) = ObjectId::from_hex(&rev.to_ascii_lowercase()) {
            if store.exists(&id)? {
                return Ok(id);
            }
        }
    }

    for candidate in [branch_ref(rev), tag_ref(rev)] {
        if let Some(id) = peel(refs, &candidate)? {
            return Ok(id);
        }
    }

    Err(unresolvable())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryRefStore;
    use seal_store::{Blob, InMemoryObjectStore};

    fn setup() -> (InMemoryRefStore, InMemoryObjectStore, ObjectId) {
        let refs = InMemoryRefStore::new();
        let store = InMemoryObjectStore::new();
        let id = store
            .write(&Blob::new(b"tip".to_vec()).to_stored_object())
            .unwrap();
        refs.write_ref("refs/heads/main", &Ref::Direct(id)).unwrap();
        refs.set_head("main").unwrap();
        (refs, store, id)
    }

    #[test]
    fn resolves_head_and_names() {
        let (refs, store, id) = setup();
        assert_eq!(resolve(&refs, &store, "HEAD").unwrap(), id);
        assert_eq!(resolve(&refs, &store, "refs/heads/main").unwrap(), id);
        assert_eq!(resolve(&refs, &store, "main").unwrap(), id);
    }

    #[test]
    fn resolves_tags_and_hex() {
        let (refs, store, id) = setup();
        refs.write_ref("refs/tags/v1", &Ref::Direct(id)).unwrap();
        assert_eq!(resolve(&refs, &store, "v1").unwrap(), id);
        assert_eq!(resolve(&refs, &store, &id.to_hex()).unwrap(), id);
        assert_eq!(
            resolve(&refs, &store, &id.to_hex().to_uppercase()).unwrap(),
            id
        );
    }

    #[test]
    fn unknown_hex_is_unresolvable() {
        let (refs, store, _) = setup();
        let missing = ObjectId::from_bytes(b"missing").to_hex();
        assert!(matches!(
            resolve(&refs, &store, &missing),
            Err(RefError::Unresolvable(_))
        ));
    }

    #[test]
    fn unborn_head_is_unresolvable() {
        let refs = InMemoryRefStore::new();
        let store = InMemoryObjectStore::new();
        refs.set_head("main").unwrap();
        assert!(matches!(
            resolve(&refs, &store, "HEAD"),
            Err(RefError::Unresolvable(_))
        ));
    }

    #[test]
    fn symbolic_loop_is_bounded() {
        let refs = InMemoryRefStore::new();
        refs.write_ref("refs/heads/a", &Ref::Symbolic("refs/heads/b".into()))
            .unwrap();
        refs.write_ref("refs/heads/b", &Ref::Symbolic("refs/heads/a".into()))
            .unwrap();
        assert!(matches!(
            peel(&refs, "refs/heads/a"),
            Err(RefError::SymbolicDepth { .. })
        ));
    }
}
