use seal_types::ObjectId;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// Content hash mismatch on read (data corruption).
    #[error("hash mismatch for {id}: stored content hashes to {computed}")]
    HashMismatch { id: ObjectId, computed: ObjectId },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The object data is malformed or of the wrong kind.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: ObjectId, reason: String },

    /// A name or email cannot appear in canonical commit text.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// A lock guarding an in-memory backend was poisoned.
    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Bytes exist under the id but are not what was written there.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, Self::HashMismatch { .. } | Self::CorruptObject { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
