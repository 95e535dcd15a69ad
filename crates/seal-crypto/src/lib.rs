//! Cryptographic primitives for Seal.
//!
//! - [`ContentHasher`] -- domain-separated BLAKE3, used by the object store to
//!   compute [`ObjectId`](seal_types::ObjectId)s
//! - [`CanonicalHasher`] -- SHA-256 over canonical object text, producing the
//!   [`Digest`](seal_types::Digest) that signatures commit to
//! - [`SignatureContainer`] -- detached S/MIME (PKCS#7 signed-data) envelope
//!   whose signed payload is the lowercase hex digest
//! - [`SigningIdentity`] / [`TrustStore`] -- private key + certificate, and the
//!   anchors a verifier accepts
//!
//! All signature work goes through OpenSSL; nothing here implements a
//! cryptographic primitive by hand. Every OpenSSL handle is an owned value
//! scoped to the call that created it.

pub mod envelope;
pub mod error;
pub mod hasher;
pub mod identity;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use envelope::{SignatureAlgorithm, SignatureContainer};
pub use error::{CryptoError, CryptoResult, DecodeError, SignStage};
pub use hasher::{CanonicalHasher, ContentHasher};
pub use identity::{subject_line, SigningIdentity, TrustStore};
