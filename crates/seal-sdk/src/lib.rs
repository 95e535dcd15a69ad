//! High-level SDK for Seal.
//!
//! [`Seal`] bundles an object store, a ref store, a note store and the
//! repository settings, and exposes the operations applications need:
//! committing, walking history, signing, and verifying.

pub mod commit;
pub mod error;
pub mod repository;

pub use commit::{CommitProposal, CommitResult, CommitSummary};
pub use error::{SdkError, SdkResult};
pub use repository::{Seal, SEAL_DIR};

// Re-export key types
pub use seal_core::{
    BatchReport, CancellationToken, ChainPolicy, SealConfig, SealError, SignResult, Verdict,
    Verification,
};
pub use seal_crypto::{SigningIdentity, TrustStore};
pub use seal_notes::{NoteEntry, NotesNamespace};
pub use seal_types::{Digest, ObjectId};
