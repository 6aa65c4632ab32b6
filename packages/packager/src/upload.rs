//! Checks applied to archives uploaded as-is, before they are stored.

use thiserror::Error;

use crate::error::Result;
use crate::layout::PackageLayout;
use crate::reader::ArchiveReader;

/// Content types browsers report for zip files.
pub const ZIP_CONTENT_TYPES: &[&str] = &[
    "application/zip",
    "application/zip-compressed",
    "application/x-zip-compressed",
    "multipart/x-zip",
];

/// Content type accepted for task package uploads.
pub const TASK_CONTENT_TYPE: &str = "application/zip";

/// A file received from a client.
#[derive(Clone, Debug, Default)]
pub struct UploadedFile {
    /// File name as sent by the client.
    pub name: String,
    pub content_type: Option<String>,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: Some(content_type.into()),
            content,
        }
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    fn content_type_or_empty(&self) -> &str {
        self.content_type.as_deref().unwrap_or_default()
    }
}

/// Rejections shown to the uploader.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("File is required.")]
    FileRequired,

    #[error("File type: {0} is not supported.")]
    UnsupportedType(String),

    #[error("File size is too large ({size_kb}KB > {limit_kb}KB).")]
    TooLarge { size_kb: u64, limit_kb: u64 },
}

/// Validate a submission archive uploaded directly.
///
/// An unsupported type is reported in preference to an oversized file. The
/// archive must also hold the submission main file.
pub fn validate_submission_upload<'f>(
    file: Option<&'f UploadedFile>,
    max_upload_kb: u64,
    layout: &PackageLayout,
) -> Result<&'f UploadedFile> {
    let file = file
        .filter(|f| !f.content.is_empty())
        .ok_or(UploadError::FileRequired)?;

    let content_type = file.content_type_or_empty();
    if !ZIP_CONTENT_TYPES.contains(&content_type) {
        return Err(UploadError::UnsupportedType(content_type.to_string()).into());
    }

    if file.size() > max_upload_kb.saturating_mul(1024) {
        return Err(UploadError::TooLarge {
            size_kb: (file.size() as f64 / 1024.0).round() as u64,
            limit_kb: max_upload_kb,
        }
        .into());
    }

    ArchiveReader::open_and_validate_bytes(&file.content, &layout.main_file)?;
    Ok(file)
}

/// Validate a task evaluation package uploaded directly.
pub fn validate_task_upload<'f>(
    file: Option<&'f UploadedFile>,
    layout: &PackageLayout,
) -> Result<&'f UploadedFile> {
    let file = file
        .filter(|f| !f.content.is_empty())
        .ok_or(UploadError::FileRequired)?;

    let content_type = file.content_type_or_empty();
    if content_type != TASK_CONTENT_TYPE {
        return Err(UploadError::UnsupportedType(content_type.to_string()).into());
    }

    ArchiveReader::open_and_validate_bytes(&file.content, &layout.main_file)?;
    Ok(file)
}
