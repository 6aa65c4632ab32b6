use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use ::common::FsArchiveStore;
use ::common::config::LoggingConfig;
use packager::{ArchiveReader, PackageLayout, PackageLayouts, PackageService};

/// Build a ZIP archive in memory with given file entries.
pub fn build_zip(files: &[(&str, &str)]) -> Vec<u8> {
    let cursor = std::io::Cursor::new(Vec::new());
    let mut writer = zip::ZipWriter::new(cursor);
    let options =
        zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, content) in files {
        writer.start_file(*name, options).expect("zip start_file");
        writer.write_all(content.as_bytes()).expect("zip write_all");
    }
    writer.finish().expect("zip finish").into_inner()
}

pub fn members(bytes: &[u8]) -> Vec<String> {
    ArchiveReader::from_bytes(bytes)
        .expect("open archive")
        .list_members()
}

pub fn text(bytes: &[u8], path: &str) -> Option<String> {
    ArchiveReader::from_bytes(bytes)
        .expect("open archive")
        .extract_text(path)
        .expect("extract text")
}

/// Layouts with top-level main files and an `extra` upload directory.
pub fn flat_layouts() -> PackageLayouts {
    PackageLayouts {
        evaluation: PackageLayout::new("main.py", "extra").with_setup_file("setup.sh"),
        template: PackageLayout::new("main.py", "extra"),
        submission: PackageLayout::new("main.py", "extra"),
    }
}

pub struct TestService {
    pub service: PackageService<FsArchiveStore>,
    pub dir: tempfile::TempDir,
}

impl TestService {
    pub async fn spawn() -> Self {
        Self::with_layouts(PackageLayouts::default()).await
    }

    pub async fn with_layouts(layouts: PackageLayouts) -> Self {
        ::common::logging::init(&LoggingConfig {
            level: "debug".into(),
        });
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsArchiveStore::new(dir.path().join("archives"), 1024 * 1024)
            .await
            .expect("create store");
        Self {
            service: PackageService::new(Arc::new(store), layouts),
            dir,
        }
    }

    /// Number of archives currently held by the store.
    pub fn stored_count(&self) -> usize {
        count_zips(&self.dir.path().join("archives"))
    }
}

fn count_zips(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                count_zips(&path)
            } else if path.extension().is_some_and(|ext| ext == "zip") {
                1
            } else {
                0
            }
        })
        .sum()
}
