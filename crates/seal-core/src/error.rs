use seal_crypto::{CryptoError, DecodeError, SignStage};
use seal_notes::NoteError;
use seal_refs::RefError;
use seal_store::StoreError;

/// Errors from signing, verification and configuration.
///
/// A failed verification is not an error: it is a
/// [`Verdict`](crate::Verdict). These variants cover the cases where no
/// verdict can be reached at all.
#[derive(Debug, thiserror::Error)]
pub enum SealError {
    /// The reference or object id does not name an existing object.
    #[error("unknown object: {0}")]
    UnknownObject(String),

    #[error("signature creation failed during {stage}: {reason}")]
    SignatureCreationFailed { stage: SignStage, reason: String },

    #[error("object store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("annotation store unavailable: {0}")]
    Notes(#[from] NoteError),

    #[error("ref error: {0}")]
    Ref(#[from] RefError),

    #[error("malformed signature envelope: {0}")]
    Decode(#[from] DecodeError),

    #[error("crypto error: {0}")]
    Crypto(CryptoError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CryptoError> for SealError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::SignatureCreation { stage, reason } => {
                Self::SignatureCreationFailed { stage, reason }
            }
            CryptoError::Decode(e) => Self::Decode(e),
            other => Self::Crypto(other),
        }
    }
}

pub type SealResult<T> = Result<T, SealError>;
