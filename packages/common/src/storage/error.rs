use thiserror::Error;

/// Failures of the archive store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No archive is stored under the given hash.
    #[error("archive not found: {0}")]
    NotFound(String),

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored reference could not be parsed as a content hash.
    #[error("invalid content hash: {0}")]
    InvalidHash(String),

    #[error("archive exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
}
