//! Error types for reference operations.

use seal_store::StoreError;
use thiserror::Error;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The reference was not found.
    #[error("ref not found: {name}")]
    NotFound { name: String },

    /// The ref or namespace name is invalid.
    #[error("invalid ref name: {name}: {reason}")]
    InvalidName { name: String, reason: String },

    /// A tag is immutable and cannot be updated.
    #[error("tag is immutable: {name}")]
    TagImmutable { name: String },

    /// Cannot delete the branch HEAD points at.
    #[error("cannot delete current branch: {name}")]
    DeleteCurrentBranch { name: String },

    /// Symbolic refs nest deeper than the resolution limit, or loop.
    #[error("symbolic ref chain too deep at {name}")]
    SymbolicDepth { name: String },

    /// Nothing matched a revision string.
    #[error("cannot resolve {0:?} to an object")]
    Unresolvable(String),

    /// The object store failed while resolving.
    #[error("object store: {0}")]
    Store(#[from] StoreError),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A lock guarding an in-memory store was poisoned.
    #[error("ref store lock poisoned")]
    Poisoned,

    /// I/O error during file-based ref operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for ref operations.
pub type Result<T> = std::result::Result<T, RefError>;
