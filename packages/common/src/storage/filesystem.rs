use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use super::error::StorageError;
use super::hash::ContentHash;
use super::traits::{ArchiveStore, BoxReader};
use crate::config::StorageConfig;

const STAGING_DIR: &str = ".staging";

/// Archive store on the local filesystem.
///
/// Archives live at `{root}/{2 hex chars}/{62 hex chars}.zip`. Writes go to
/// `{root}/.staging` first and are renamed into place once complete, so a
/// reader never observes a half-written archive.
pub struct FsArchiveStore {
    root: PathBuf,
    max_size: u64,
}

impl FsArchiveStore {
    pub async fn new(root: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(root.join(STAGING_DIR)).await?;
        Ok(Self { root, max_size })
    }

    pub async fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        Self::new(config.root.clone(), config.max_archive_size).await
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn archive_path(&self, hash: &ContentHash) -> PathBuf {
        let (prefix, rest) = hash.shard();
        self.root.join(prefix).join(format!("{rest}.zip"))
    }

    fn staging_path(&self) -> PathBuf {
        self.root
            .join(STAGING_DIR)
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Copy `reader` into `staged`, hashing as it goes.
    async fn stage(
        &self,
        staged: &Path,
        mut reader: BoxReader,
    ) -> Result<ContentHash, StorageError> {
        let mut file = fs::File::create(staged).await?;
        let mut hasher = Sha256::new();
        let mut total: u64 = 0;
        let mut buf = vec![0u8; 64 * 1024];

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            total += n as u64;
            if total > self.max_size {
                return Err(StorageError::SizeLimitExceeded {
                    actual: total,
                    limit: self.max_size,
                });
            }
            hasher.update(&buf[..n]);
            file.write_all(&buf[..n]).await?;
        }

        file.flush().await?;
        Ok(ContentHash::from_digest(hasher))
    }

    /// Move a fully written staging file to its final location.
    async fn install(&self, staged: &Path, hash: &ContentHash) -> Result<(), StorageError> {
        let target = self.archive_path(hash);
        if fs::try_exists(&target).await? {
            // Same bytes are already stored.
            fs::remove_file(staged).await?;
            return Ok(());
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::rename(staged, &target).await?;
        debug!(hash = %hash, "Archive stored");
        Ok(())
    }
}

#[async_trait]
impl ArchiveStore for FsArchiveStore {
    async fn write(&self, reader: BoxReader) -> Result<ContentHash, StorageError> {
        let staged = self.staging_path();
        let result = match self.stage(&staged, reader).await {
            Ok(hash) => self.install(&staged, &hash).await.map(|()| hash),
            Err(e) => Err(e),
        };
        if result.is_err() {
            let _ = fs::remove_file(&staged).await;
        }
        result
    }

    async fn open(&self, hash: &ContentHash) -> Result<BoxReader, StorageError> {
        match fs::File::open(self.archive_path(hash)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(hash.to_hex())),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.archive_path(hash)).await?)
    }

    async fn delete(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        match fs::remove_file(self.archive_path(hash)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, hash: &ContentHash) -> Result<u64, StorageError> {
        match fs::metadata(self.archive_path(hash)).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(hash.to_hex())),
            Err(e) => Err(e.into()),
        }
    }
}
