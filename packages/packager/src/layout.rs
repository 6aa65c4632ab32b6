use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{PackageError, Result};
use crate::rebuild;
use crate::request::MutationRequest;

/// The three kinds of archive the portal keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PackageKind {
    /// Instructor evaluation code for a task.
    Evaluation,
    /// Starter code handed to students.
    Template,
    /// A student's solution.
    Submission,
}

impl PackageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Evaluation => "evaluation",
            Self::Template => "template",
            Self::Submission => "submission",
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical member paths of one kind of archive.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PackageLayout {
    /// Entry point every archive of this kind must contain.
    pub main_file: String,
    /// Environment setup script, for kinds that have one.
    #[serde(default)]
    pub setup_file: Option<String>,
    /// Directory uploaded extra files are placed under.
    pub upload_dir: String,
    /// Archive used as the base when an owner has none yet. A generated
    /// archive holding an empty main file is used when unset.
    #[serde(default)]
    pub skeleton: Option<PathBuf>,
}

impl PackageLayout {
    pub fn new(main_file: impl Into<String>, upload_dir: impl Into<String>) -> Self {
        Self {
            main_file: main_file.into(),
            setup_file: None,
            upload_dir: upload_dir.into(),
            skeleton: None,
        }
    }

    pub fn with_setup_file(mut self, setup_file: impl Into<String>) -> Self {
        self.setup_file = Some(setup_file.into());
        self
    }

    /// Main and setup paths. These never show up as removable extra files.
    pub fn scaffold(&self) -> Vec<&str> {
        let mut paths = vec![self.main_file.as_str()];
        paths.extend(self.setup_file.as_deref());
        paths
    }

    pub fn is_scaffold(&self, path: &str) -> bool {
        self.main_file == path || self.setup_file.as_deref() == Some(path)
    }

    /// Archive path for an uploaded file.
    ///
    /// Only the final component of the client-supplied name is kept, so an
    /// upload can never escape the upload directory.
    pub fn upload_path(&self, file_name: &str) -> Result<String> {
        let base = file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .trim();
        if base.is_empty() || base == "." || base == ".." {
            return Err(PackageError::InvalidMemberPath(file_name.to_string()));
        }

        let dir = self.upload_dir.trim_matches('/');
        let path = if dir.is_empty() {
            base.to_string()
        } else {
            format!("{dir}/{base}")
        };

        if self.is_scaffold(&path) {
            return Err(PackageError::ReservedPath(path));
        }
        Ok(path)
    }

    /// Minimal valid archive for this layout: an empty main file.
    pub fn generated_skeleton(&self) -> Result<Vec<u8>> {
        let mut request = MutationRequest::default();
        request.add_text(&self.main_file, "");
        rebuild::rebuild_bytes(&rebuild::empty_archive()?, &request)
    }
}

/// Layouts of every archive kind. Passed explicitly to the assemblers.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PackageLayouts {
    pub evaluation: PackageLayout,
    pub template: PackageLayout,
    pub submission: PackageLayout,
}

impl PackageLayouts {
    pub fn get(&self, kind: PackageKind) -> &PackageLayout {
        match kind {
            PackageKind::Evaluation => &self.evaluation,
            PackageKind::Template => &self.template,
            PackageKind::Submission => &self.submission,
        }
    }
}

impl Default for PackageLayouts {
    fn default() -> Self {
        Self {
            evaluation: PackageLayout::new("task/main.py", "task").with_setup_file("task/setup.sh"),
            template: PackageLayout::new("submission/main.py", "submission"),
            submission: PackageLayout::new("submission/main.py", "submission"),
        }
    }
}
