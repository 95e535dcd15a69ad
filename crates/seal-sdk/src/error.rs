use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("repository not initialized at {0}")]
    NotInitialized(String),

    #[error("repository already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error(transparent)]
    Seal(#[from] seal_core::SealError),

    #[error("store error: {0}")]
    Store(#[from] seal_store::StoreError),

    #[error("ref error: {0}")]
    Ref(#[from] seal_refs::RefError),

    #[error("notes error: {0}")]
    Notes(#[from] seal_notes::NoteError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SdkResult<T> = Result<T, SdkError>;
