use common::ContentHash;

use crate::error::{PackageError, Result};
use crate::layout::PackageLayout;
use crate::reader::ArchiveReader;
use crate::rebuild::rebuild_bytes;
use crate::request::MutationRequest;
use crate::upload::UploadedFile;

/// A freshly built archive, ready to be stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssembledArchive {
    /// Download file name.
    pub name: String,
    pub bytes: Vec<u8>,
    pub hash: ContentHash,
}

impl AssembledArchive {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let hash = ContentHash::compute(&bytes);
        Self {
            name: name.into(),
            bytes,
            hash,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Queue uploaded extra files under the layout's upload directory.
pub(crate) fn plan_uploads(
    request: &mut MutationRequest,
    layout: &PackageLayout,
    files: &[UploadedFile],
) -> Result<()> {
    for file in files {
        let path = layout.upload_path(&file.name)?;
        request.add_binary(path, file.content.clone());
    }
    Ok(())
}

/// Queue deletions, each of which must name an extra file of `base`.
pub(crate) fn plan_deletes(
    request: &mut MutationRequest,
    layout: &PackageLayout,
    base: &[u8],
    deletes: &[String],
) -> Result<()> {
    if deletes.is_empty() {
        return Ok(());
    }
    let removable = ArchiveReader::from_bytes(base)?.auxiliary_members(&layout.scaffold());
    for path in deletes {
        if !removable.contains(path) {
            return Err(PackageError::NotDeletable(path.clone()));
        }
        request.delete(path.as_str());
    }
    Ok(())
}

/// Rebuild `base` and make sure the result still holds the main file.
pub(crate) fn build(
    base: &[u8],
    request: &MutationRequest,
    layout: &PackageLayout,
    name: String,
) -> Result<AssembledArchive> {
    let bytes = rebuild_bytes(base, request)?;
    ArchiveReader::open_and_validate_bytes(&bytes, &layout.main_file)?;
    Ok(AssembledArchive::new(name, bytes))
}
