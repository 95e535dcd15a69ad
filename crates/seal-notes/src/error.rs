use seal_refs::RefError;

/// Errors from note store operations.
#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    /// The namespace name failed validation.
    #[error("invalid notes namespace: {0}")]
    InvalidNamespace(#[from] RefError),

    /// A notes file could not be parsed.
    #[error("corrupt notes for {namespace}: {reason}")]
    Corrupt { namespace: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("note store lock poisoned")]
    Poisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type NoteResult<T> = Result<T, NoteError>;
