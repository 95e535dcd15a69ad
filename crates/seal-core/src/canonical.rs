use seal_crypto::CanonicalHasher;
use seal_store::ObjectStore;
use seal_types::{Digest, ObjectId};

use crate::error::{SealError, SealResult};

/// SHA-256 of the object's current canonical content.
pub fn object_digest(objects: &dyn ObjectStore, target: &ObjectId) -> SealResult<Digest> {
    let object = objects
        .read(target)?
        .ok_or_else(|| SealError::UnknownObject(target.to_hex()))?;
    Ok(CanonicalHasher::digest(&object.canonical_content()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use seal_store::{Blob, InMemoryObjectStore};

    #[test]
    fn blob_digest_is_sha256_of_bytes() {
        let store = InMemoryObjectStore::new();
        let id = store.write(&Blob::new(b"hello".to_vec()).to_stored_object()).unwrap();
        assert_eq!(
            object_digest(&store, &id).unwrap().to_hex(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn missing_object_is_unknown() {
        let store = InMemoryObjectStore::new();
        assert!(matches!(
            object_digest(&store, &ObjectId::from_bytes(b"x")),
            Err(SealError::UnknownObject(_))
        ));
    }
}
