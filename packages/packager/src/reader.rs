use std::io::{Cursor, Read, Seek};

use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{PackageError, Result};

/// Largest member we are willing to inflate into memory (64 MB).
pub const MAX_MEMBER_SIZE: u64 = 64 * 1024 * 1024;

/// Read-only access to one archive snapshot.
pub struct ArchiveReader<R> {
    archive: ZipArchive<R>,
}

impl<'a> ArchiveReader<Cursor<&'a [u8]>> {
    /// Open an in-memory archive. Zero bytes count as no archive at all.
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(PackageError::ArchiveAbsent);
        }
        Self::open(Cursor::new(bytes))
    }

    pub fn open_and_validate_bytes(bytes: &'a [u8], required_path: &str) -> Result<Self> {
        let reader = Self::from_bytes(bytes)?;
        reader.require(required_path)?;
        Ok(reader)
    }
}

impl<R: Read + Seek> ArchiveReader<R> {
    pub fn open(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader).map_err(corrupt)?;
        Ok(Self { archive })
    }

    /// Open an archive and check it holds `required_path`.
    pub fn open_and_validate(reader: R, required_path: &str) -> Result<Self> {
        let reader = Self::open(reader)?;
        reader.require(required_path)?;
        Ok(reader)
    }

    pub fn require(&self, path: &str) -> Result<()> {
        if self.contains(path) {
            Ok(())
        } else {
            Err(PackageError::RequiredMemberMissing {
                path: path.to_string(),
            })
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.archive.index_for_name(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Member paths in archive order.
    pub fn list_members(&self) -> Vec<String> {
        (0..self.archive.len())
            .filter_map(|i| self.archive.name_for_index(i))
            .map(str::to_owned)
            .collect()
    }

    /// Extra files a user may remove: nested members other than `scaffold`.
    pub fn auxiliary_members(&self, scaffold: &[&str]) -> Vec<String> {
        (0..self.archive.len())
            .filter_map(|i| self.archive.name_for_index(i))
            .filter(|name| is_nested(name) && !scaffold.contains(name))
            .map(str::to_owned)
            .collect()
    }

    /// Raw member content, or `None` if there is no such member.
    pub fn extract_bytes(&mut self, path: &str) -> Result<Option<Vec<u8>>> {
        let file = match self.archive.by_name(path) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(corrupt(e)),
        };

        let mut buf = Vec::new();
        file.take(MAX_MEMBER_SIZE + 1)
            .read_to_end(&mut buf)
            .map_err(|e| PackageError::ArchiveCorrupt(format!("failed to read '{path}': {e}")))?;

        if buf.len() as u64 > MAX_MEMBER_SIZE {
            return Err(PackageError::MemberTooLarge {
                path: path.to_string(),
                limit: MAX_MEMBER_SIZE,
            });
        }
        Ok(Some(buf))
    }

    /// Member content decoded as UTF-8, or `None` if there is no such member.
    pub fn extract_text(&mut self, path: &str) -> Result<Option<String>> {
        match self.extract_bytes(path)? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| PackageError::Decode {
                    path: path.to_string(),
                }),
            None => Ok(None),
        }
    }
}

/// Whether `path` sits below a directory, i.e. has a non-empty part on both
/// sides of some `/`.
pub fn is_nested(path: &str) -> bool {
    path.char_indices()
        .any(|(i, c)| c == '/' && i > 0 && i + 1 < path.len())
}

/// Label for a removable member: its path without the top-level directory.
pub fn member_label(path: &str) -> &str {
    path.split_once('/').map_or("", |(_, rest)| rest)
}

fn corrupt(e: ZipError) -> PackageError {
    PackageError::ArchiveCorrupt(e.to_string())
}
