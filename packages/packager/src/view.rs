use std::io::Cursor;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::layout::PackageLayout;
use crate::reader::{ArchiveReader, member_label};

/// A removable extra file, as offered to the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeleteChoice {
    pub path: String,
    pub label: String,
}

/// What an edit form shows for one stored package.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PackageContents {
    pub code: String,
    /// Present only for layouts with a setup file.
    pub setup: Option<String>,
    pub members: Vec<String>,
    pub delete_choices: Vec<DeleteChoice>,
}

/// Lenient read access to a stored package.
///
/// A missing, empty or corrupt archive, or one without the layout's main
/// file, reads as an empty package instead of failing. Text that is not
/// UTF-8 is still an error.
pub struct PackageView<'a> {
    layout: &'a PackageLayout,
    reader: Option<ArchiveReader<Cursor<&'a [u8]>>>,
}

impl<'a> PackageView<'a> {
    pub fn new(bytes: Option<&'a [u8]>, layout: &'a PackageLayout) -> Self {
        let reader = bytes.and_then(|bytes| {
            match ArchiveReader::open_and_validate_bytes(bytes, &layout.main_file) {
                Ok(reader) => Some(reader),
                Err(e) => {
                    debug!(error = %e, "package unusable, reading as empty");
                    None
                }
            }
        });
        Self { layout, reader }
    }

    pub fn is_valid(&self) -> bool {
        self.reader.is_some()
    }

    pub fn members(&self) -> Vec<String> {
        self.reader
            .as_ref()
            .map(ArchiveReader::list_members)
            .unwrap_or_default()
    }

    pub fn auxiliary_members(&self) -> Vec<String> {
        self.reader
            .as_ref()
            .map(|r| r.auxiliary_members(&self.layout.scaffold()))
            .unwrap_or_default()
    }

    pub fn delete_choices(&self) -> Vec<DeleteChoice> {
        self.auxiliary_members()
            .into_iter()
            .map(|path| DeleteChoice {
                label: member_label(&path).to_string(),
                path,
            })
            .collect()
    }

    /// Main file text, empty for an unusable package.
    pub fn code(&mut self) -> Result<String> {
        let layout = self.layout;
        self.text_or_empty(&layout.main_file)
    }

    /// Setup file text, empty when the package or the member is missing.
    pub fn setup(&mut self) -> Result<String> {
        let layout = self.layout;
        match &layout.setup_file {
            Some(path) => self.text_or_empty(path),
            None => Ok(String::new()),
        }
    }

    /// Every member with its content, in archive order.
    pub fn files(&mut self) -> Result<Vec<(String, Vec<u8>)>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(Vec::new());
        };
        let mut files = Vec::with_capacity(reader.len());
        for path in reader.list_members() {
            let content = reader.extract_bytes(&path)?.unwrap_or_default();
            files.push((path, content));
        }
        Ok(files)
    }

    pub fn contents(&mut self) -> Result<PackageContents> {
        let setup = match self.layout.setup_file {
            Some(_) => Some(self.setup()?),
            None => None,
        };
        Ok(PackageContents {
            code: self.code()?,
            setup,
            members: self.members(),
            delete_choices: self.delete_choices(),
        })
    }

    fn text_or_empty(&mut self, path: &str) -> Result<String> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(String::new());
        };
        match reader.extract_text(path) {
            Ok(text) => Ok(text.unwrap_or_default()),
            Err(e) if e.is_unusable_archive() => Ok(String::new()),
            Err(e) => Err(e),
        }
    }
}
