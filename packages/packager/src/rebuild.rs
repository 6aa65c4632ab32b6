//! Produce a new archive from an existing one plus a [`MutationRequest`].
//!
//! Members are never modified in place: everything not excluded by the
//! request is copied across in its original order (compressed bytes as-is,
//! after checking they inflate cleanly), then the added binary members, then
//! the added text members. The output
//! only becomes visible once the whole archive has been written.

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{PackageError, Result};
use crate::request::MutationRequest;

fn member_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644)
}

/// Copy `source` into `target`, applying `request`. Returns the finished target.
pub fn rebuild<R, W>(source: R, target: W, request: &MutationRequest) -> Result<W>
where
    R: Read + Seek,
    W: Write + Seek,
{
    request.validate()?;

    let mut source =
        ZipArchive::new(source).map_err(|e| PackageError::ArchiveCorrupt(e.to_string()))?;
    let mut writer = ZipWriter::new(target);
    let exclusions = request.exclusions();

    let mut copied = 0usize;
    let mut dropped = 0usize;
    for i in 0..source.len() {
        let excluded = {
            let member = source
                .by_index_raw(i)
                .map_err(|e| PackageError::ArchiveCorrupt(e.to_string()))?;
            exclusions.contains(member.name())
        };
        if excluded {
            dropped += 1;
            continue;
        }
        verify_member(&mut source, i)?;
        let member = source
            .by_index_raw(i)
            .map_err(|e| PackageError::ArchiveCorrupt(e.to_string()))?;
        writer.raw_copy_file(member)?;
        copied += 1;
    }

    let options = member_options();
    for (path, content) in request.binary_entries() {
        writer.start_file(path.as_str(), options)?;
        writer.write_all(content)?;
    }
    for (path, text) in request.text_entries() {
        writer.start_file(path.as_str(), options)?;
        writer.write_all(text.as_bytes())?;
    }

    let target = writer.finish()?;
    debug!(
        copied,
        dropped,
        binary = request.binary_entries().len(),
        text = request.text_entries().len(),
        "archive rebuilt"
    );
    Ok(target)
}

/// Inflate member `index` and discard it, so a bad checksum or truncated
/// data fails here instead of being copied into the output.
fn verify_member<R: Read + Seek>(source: &mut ZipArchive<R>, index: usize) -> Result<()> {
    let mut member = source
        .by_index(index)
        .map_err(|e| PackageError::ArchiveCorrupt(e.to_string()))?;
    io::copy(&mut member, &mut io::sink()).map_err(|e| {
        PackageError::ArchiveCorrupt(format!("failed to read '{}': {e}", member.name()))
    })?;
    Ok(())
}

/// In-memory [`rebuild`]. Zero-length input is treated as a corrupt source.
pub fn rebuild_bytes(source: &[u8], request: &MutationRequest) -> Result<Vec<u8>> {
    if source.is_empty() {
        return Err(PackageError::ArchiveCorrupt("archive is empty".into()));
    }
    let target = rebuild(Cursor::new(source), Cursor::new(Vec::new()), request)?;
    Ok(target.into_inner())
}

/// File-to-file [`rebuild`].
///
/// The archive is staged next to `dest` and renamed over it when complete, so
/// on any failure `dest` is left untouched and no partial file remains.
pub fn rebuild_file(source: &Path, dest: &Path, request: &MutationRequest) -> Result<()> {
    let input = match File::open(source) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PackageError::ArchiveAbsent);
        }
        Err(e) => return Err(e.into()),
    };
    if input.metadata()?.len() == 0 {
        return Err(PackageError::ArchiveCorrupt("archive is empty".into()));
    }

    let dir = match dest.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let staged = NamedTempFile::new_in(dir)?;
    let staged = rebuild(BufReader::new(input), staged, request)?;
    staged.as_file().sync_all()?;
    staged.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

/// An archive with no members.
pub fn empty_archive() -> Result<Vec<u8>> {
    let writer = ZipWriter::new(Cursor::new(Vec::new()));
    Ok(writer.finish()?.into_inner())
}
