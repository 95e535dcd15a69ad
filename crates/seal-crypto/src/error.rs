use std::fmt;

use seal_types::TypeError;

/// Stage of signature creation that failed.
///
/// Carried in [`CryptoError::SignatureCreation`] so callers can tell a bad
/// key apart from a failure inside the envelope library.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignStage {
    /// The private key type is not supported for S/MIME signing.
    KeyType,
    /// The certificate does not carry the public half of the private key.
    KeyMismatch,
    /// PKCS#7 signed-data construction.
    Envelope,
    /// Writing the S/MIME encoding.
    Encode,
}

impl fmt::Display for SignStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::KeyType => "key type",
            Self::KeyMismatch => "key/certificate pairing",
            Self::Envelope => "envelope construction",
            Self::Encode => "envelope encoding",
        };
        f.write_str(s)
    }
}

/// Reasons a serialized envelope is rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("not a readable S/MIME signed message: {0}")]
    Envelope(String),

    #[error("envelope carries no detached payload")]
    MissingPayload,

    #[error("payload is not a canonical digest: {0}")]
    InvalidPayload(#[from] TypeError),

    #[error("payload is not valid UTF-8")]
    PayloadEncoding,

    #[error("envelope carries no signer certificate")]
    MissingSigner,

    #[error("expected exactly one signer, found {0}")]
    MultipleSigners(usize),

    #[error("unsupported signer key type: {0}")]
    UnsupportedKey(String),
}

/// Errors from cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// PEM material could not be parsed. The message never echoes the input.
    #[error("failed to load {what}: {reason}")]
    Load { what: &'static str, reason: String },

    #[error("signature creation failed during {stage}: {reason}")]
    SignatureCreation { stage: SignStage, reason: String },

    #[error("malformed signature envelope: {0}")]
    Decode(#[from] DecodeError),

    /// The envelope's signature does not verify against its signer certificate.
    #[error("signature does not verify: {0}")]
    BadSignature(String),

    /// The signer certificate does not chain to any configured anchor.
    #[error("signer certificate not trusted: {0}")]
    Untrusted(String),

    /// OpenSSL failed outside of a signing or verification decision.
    #[error("openssl error: {0}")]
    Openssl(#[from] openssl::error::ErrorStack),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
