//! Signing and verification engine for Seal.
//!
//! A signature is a detached S/MIME envelope over the SHA-256 digest of an
//! object's canonical content. It is stored as a blob and attached to the
//! object through a note in a dedicated namespace (`refs/notes/crypto` by
//! default), so signing never changes the object or its id.
//!
//! - [`Signer`] -- resolve, digest, sign, write blob, attach note
//! - [`Verifier`] -- look up, decode, check signature and chain, compare
//!   digests, and return a [`Verdict`]
//! - [`verify_all`] -- many objects with cooperative cancellation
//! - [`AnnotationBridge`] -- the note store pinned to one namespace
//! - [`SealConfig`] -- TOML settings for identity, trust and namespace

pub mod batch;
pub mod bridge;
pub mod canonical;
pub mod config;
pub mod error;
pub mod signer;
pub mod verifier;

#[cfg(test)]
mod testing;

pub use batch::{verify_all, BatchReport};
pub use bridge::AnnotationBridge;
pub use canonical::object_digest;
pub use config::{NotesConfig, SealConfig, SigningConfig, VerifyConfig};
pub use error::{SealError, SealResult};
pub use signer::{SignResult, Signer};
pub use verifier::{ChainPolicy, Verdict, Verification, Verifier};

pub use tokio_util::sync::CancellationToken;
