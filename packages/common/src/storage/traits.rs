use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::hash::ContentHash;

pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Durable, content-addressed home of task and submission archives.
///
/// Archives are never modified in place: every edit stores a new blob and the
/// owner swaps its reference.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Store an archive and return its content hash.
    async fn put(&self, data: &[u8]) -> Result<ContentHash, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.write(reader).await
    }

    /// Drain `reader` into the store. Nothing becomes visible under the
    /// returned hash until the whole stream has been written.
    async fn write(&self, reader: BoxReader) -> Result<ContentHash, StorageError>;

    /// Read a whole archive into memory.
    async fn read(&self, hash: &ContentHash) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.open(hash).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    async fn open(&self, hash: &ContentHash) -> Result<BoxReader, StorageError>;

    async fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError>;

    /// Returns `false` if nothing was stored under `hash`.
    async fn delete(&self, hash: &ContentHash) -> Result<bool, StorageError>;

    async fn size(&self, hash: &ContentHash) -> Result<u64, StorageError>;
}
