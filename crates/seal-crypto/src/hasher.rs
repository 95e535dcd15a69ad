use seal_types::{Digest, ObjectId};
use sha2::{Digest as _, Sha256};

/// Domain-separated BLAKE3 hasher for store addresses.
///
/// Each hasher carries a domain tag that is prepended to every computation,
/// so a blob and a commit with identical bytes get different object ids.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    pub const BLOB: Self = Self {
        domain: "seal-blob-v1",
    };
    pub const TREE: Self = Self {
        domain: "seal-tree-v1",
    };
    pub const COMMIT: Self = Self {
        domain: "seal-commit-v1",
    };

    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    /// Check that `data` hashes to `expected` under this domain.
    pub fn verify(&self, data: &[u8], expected: &ObjectId) -> bool {
        self.hash(data) == *expected
    }

    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// SHA-256 over an object's canonical content.
///
/// The hasher digests exactly the bytes it is handed. Producing a
/// reproducible canonical form (pretty commit text, LF line endings) is the
/// caller's job; see `StoredObject::canonical_content` in `seal-store`.
pub struct CanonicalHasher;

impl CanonicalHasher {
    pub fn digest(content: &[u8]) -> Digest {
        Digest::from_bytes(Sha256::digest(content).into())
    }

    /// Streaming form for callers that assemble canonical content in pieces.
    pub fn digest_parts<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> Digest {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        Digest::from_bytes(hasher.finalize().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn content_hash_is_deterministic() {
        assert_eq!(ContentHasher::BLOB.hash(b"data"), ContentHasher::BLOB.hash(b"data"));
    }

    #[test]
    fn domains_separate_object_ids() {
        let data = b"same content";
        assert_ne!(ContentHasher::BLOB.hash(data), ContentHasher::COMMIT.hash(data));
        assert_ne!(ContentHasher::BLOB.hash(data), ContentHasher::TREE.hash(data));
    }

    #[test]
    fn content_hash_verify() {
        let id = ContentHasher::TREE.hash(b"original");
        assert!(ContentHasher::TREE.verify(b"original", &id));
        assert!(!ContentHasher::TREE.verify(b"tampered", &id));
    }

    #[test]
    fn sha256_known_vector() {
        let d = CanonicalHasher::digest(b"hello");
        assert_eq!(
            d.to_hex(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn digest_differs_from_object_id() {
        let d = CanonicalHasher::digest(b"hello");
        let id = ContentHasher::BLOB.hash(b"hello");
        assert_ne!(d.as_bytes(), id.as_bytes());
    }

    #[test]
    fn one_byte_change_changes_digest() {
        assert_ne!(CanonicalHasher::digest(b"hello"), CanonicalHasher::digest(b"hello!"));
    }

    proptest! {
        #[test]
        fn digest_is_deterministic(content in proptest::collection::vec(any::<u8>(), 0..512)) {
            let copy = content.clone();
            prop_assert_eq!(CanonicalHasher::digest(&content), CanonicalHasher::digest(&copy));
        }

        #[test]
        fn split_digest_matches_whole(content in proptest::collection::vec(any::<u8>(), 0..512), at in 0usize..512) {
            let at = at.min(content.len());
            let (a, b) = content.split_at(at);
            prop_assert_eq!(CanonicalHasher::digest_parts([a, b]), CanonicalHasher::digest(&content));
        }
    }
}
