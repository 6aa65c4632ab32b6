use common::StorageError;
use thiserror::Error;

use crate::layout::PackageKind;
use crate::upload::UploadError;

#[derive(Debug, Error)]
pub enum PackageError {
    /// No archive is stored, or the stored file is empty.
    #[error("archive is absent")]
    ArchiveAbsent,

    /// The bytes do not parse as a zip archive.
    #[error("archive is corrupt: {0}")]
    ArchiveCorrupt(String),

    #[error("archive has no '{path}' entry")]
    RequiredMemberMissing { path: String },

    #[error("'{path}' is not valid UTF-8 text")]
    Decode { path: String },

    #[error("'{path}' exceeds {limit} bytes when decompressed")]
    MemberTooLarge { path: String, limit: u64 },

    #[error("invalid member path '{0}'")]
    InvalidMemberPath(String),

    /// An uploaded file would land on a main or setup file path.
    #[error("'{0}' is reserved for the package's own files")]
    ReservedPath(String),

    /// A deletion named something other than an extra file of the base archive.
    #[error("'{0}' is not a removable file of this package")]
    NotDeletable(String),

    #[error("{kind} packages have no setup file")]
    NoSetupFile { kind: PackageKind },

    #[error("extra files are not allowed for this task")]
    FilesNotAllowed,

    /// One archive of a task's evaluation/template pair could not be rebuilt.
    #[error("{failed} package could not be rebuilt: {source}")]
    PartialAssemblyFailure {
        failed: PackageKind,
        #[source]
        source: Box<PackageError>,
    },

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("archive IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive write failed: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl PackageError {
    /// Whether the error means "there is no usable archive here" rather than
    /// a failure worth reporting. Read paths fall back to empty content on
    /// these.
    pub fn is_unusable_archive(&self) -> bool {
        matches!(
            self,
            Self::ArchiveAbsent | Self::ArchiveCorrupt(_) | Self::RequiredMemberMissing { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PackageError>;
