//! Foundation types for Seal.
//!
//! Every other Seal crate depends on `seal-types`.
//!
//! - [`ObjectId`] -- the store's content address (BLAKE3 over the stored encoding)
//! - [`Digest`] -- the SHA-256 digest of an object's canonical text, carried
//!   inside signature envelopes
//!
//! A store address is never accepted where a signed digest is expected, and
//! vice versa.

pub mod digest;
pub mod error;
pub mod object;

pub use digest::Digest;
pub use error::TypeError;
pub use object::ObjectId;
