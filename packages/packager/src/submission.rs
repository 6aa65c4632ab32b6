use std::sync::LazyLock;

use regex::{NoExpand, Regex};
use tracing::info;

use crate::assembly::{self, AssembledArchive};
use crate::error::{PackageError, Result};
use crate::layout::PackageLayout;
use crate::naming::random_archive_name;
use crate::request::MutationRequest;
use crate::upload::UploadedFile;

/// An inline edit of a submission.
#[derive(Clone, Debug, Default)]
pub struct SubmissionEdit {
    /// New content of the main file.
    pub code: String,
    pub add_files: Vec<UploadedFile>,
    /// Extra files of the base archive to leave out.
    pub delete_files: Vec<String>,
}

impl SubmissionEdit {
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    fn touches_files(&self) -> bool {
        !self.add_files.is_empty() || !self.delete_files.is_empty()
    }
}

/// Builds a new submission archive from a base archive and an inline edit.
///
/// The base is the student's previous submission when resubmitting, else
/// the task template; resolving it is the caller's job.
#[derive(Clone, Debug)]
pub struct SubmissionAssembler<'a> {
    layout: &'a PackageLayout,
    files_allowed: bool,
}

impl<'a> SubmissionAssembler<'a> {
    pub fn new(layout: &'a PackageLayout) -> Self {
        Self {
            layout,
            files_allowed: true,
        }
    }

    /// Whether the task lets students add or remove extra files.
    pub fn files_allowed(mut self, allowed: bool) -> Self {
        self.files_allowed = allowed;
        self
    }

    /// Turn `edit` into a mutation of `base`, without building anything.
    pub fn plan(&self, base: &[u8], edit: &SubmissionEdit) -> Result<MutationRequest> {
        if !self.files_allowed && edit.touches_files() {
            return Err(PackageError::FilesNotAllowed);
        }

        let mut request = MutationRequest::default();
        assembly::plan_deletes(&mut request, self.layout, base, &edit.delete_files)?;
        assembly::plan_uploads(&mut request, self.layout, &edit.add_files)?;
        request.add_text(&self.layout.main_file, edit.code.as_str());
        Ok(request)
    }

    pub fn assemble(&self, base: &[u8], edit: &SubmissionEdit) -> Result<AssembledArchive> {
        let request = self.plan(base, edit)?;
        let archive = assembly::build(base, &request, self.layout, random_archive_name())?;
        info!(
            name = %archive.name,
            hash = %archive.hash,
            added = edit.add_files.len(),
            deleted = edit.delete_files.len(),
            "submission package assembled"
        );
        Ok(archive)
    }
}

/// A `[UPPER text]` marker; never spans lines.
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[A-Z]+ (.+)\]").expect("valid tag pattern"));

/// Description of a resubmission derived from `base_name`.
///
/// An existing `[TAG ...]` marker is rewritten to point at `base_name`
/// rather than stacking another one in front.
pub fn resubmission_description(base_name: &str, description: &str) -> String {
    let tag = format!("[FROM {base_name}]");
    if !description.contains("FROM") {
        return if description.is_empty() {
            tag
        } else {
            format!("{tag} {description}")
        };
    }

    TAG.replace_all(description, NoExpand(&tag)).into_owned()
}
