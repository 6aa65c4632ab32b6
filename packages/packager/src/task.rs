use tracing::{info, warn};

use crate::assembly::{self, AssembledArchive};
use crate::error::{PackageError, Result};
use crate::layout::{PackageKind, PackageLayout, PackageLayouts};
use crate::naming::safe_file_stem;
use crate::request::MutationRequest;
use crate::upload::UploadedFile;

/// An inline edit of a task's evaluation and template packages.
#[derive(Clone, Debug, Default)]
pub struct TaskEdit {
    /// New evaluation main file.
    pub code: String,
    /// New setup script. `None` carries the existing one over.
    pub setup: Option<String>,
    pub add_files: Vec<UploadedFile>,
    pub delete_files: Vec<String>,
    /// New template main file. `None` carries the existing one over.
    pub template_code: Option<String>,
    pub template_add_files: Vec<UploadedFile>,
    pub template_delete_files: Vec<String>,
}

/// The evaluation and template archives of one task edit.
#[derive(Clone, Debug)]
pub struct TaskPackages {
    pub evaluation: AssembledArchive,
    pub template: AssembledArchive,
}

/// Rebuilds both packages of a task from their previous versions.
#[derive(Clone, Debug)]
pub struct TaskAssembler<'a> {
    layouts: &'a PackageLayouts,
}

impl<'a> TaskAssembler<'a> {
    pub fn new(layouts: &'a PackageLayouts) -> Self {
        Self { layouts }
    }

    /// Build both archives. Either both are returned or neither is.
    ///
    /// If exactly one rebuild fails the error is a
    /// [`PackageError::PartialAssemblyFailure`] naming it. If both fail the
    /// evaluation error is returned.
    pub fn assemble(
        &self,
        task_name: &str,
        edit: &TaskEdit,
        evaluation_base: &[u8],
        template_base: &[u8],
    ) -> Result<TaskPackages> {
        let stem = safe_file_stem(task_name);
        let evaluation = self.evaluation(evaluation_base, edit, format!("{stem}.zip"));
        let template = self.template(template_base, edit, format!("{stem}-template.zip"));

        match (evaluation, template) {
            (Ok(evaluation), Ok(template)) => {
                info!(
                    task = task_name,
                    evaluation = %evaluation.hash,
                    template = %template.hash,
                    "task packages assembled"
                );
                Ok(TaskPackages {
                    evaluation,
                    template,
                })
            }
            (Err(e), Ok(_)) => Err(partial(PackageKind::Evaluation, e)),
            (Ok(_), Err(e)) => Err(partial(PackageKind::Template, e)),
            (Err(e), Err(other)) => {
                warn!(task = task_name, error = %other, "template package also failed");
                Err(e)
            }
        }
    }

    pub fn plan_evaluation(&self, base: &[u8], edit: &TaskEdit) -> Result<MutationRequest> {
        let layout = &self.layouts.evaluation;
        let mut request = MutationRequest::default();
        assembly::plan_deletes(&mut request, layout, base, &edit.delete_files)?;
        assembly::plan_uploads(&mut request, layout, &edit.add_files)?;
        request.add_text(&layout.main_file, edit.code.as_str());
        if let Some(setup) = &edit.setup {
            let path = setup_path(layout, PackageKind::Evaluation)?;
            request.add_text(path, setup.as_str());
        }
        Ok(request)
    }

    pub fn plan_template(&self, base: &[u8], edit: &TaskEdit) -> Result<MutationRequest> {
        let layout = &self.layouts.template;
        let mut request = MutationRequest::default();
        assembly::plan_deletes(&mut request, layout, base, &edit.template_delete_files)?;
        assembly::plan_uploads(&mut request, layout, &edit.template_add_files)?;
        if let Some(code) = &edit.template_code {
            request.add_text(&layout.main_file, code.as_str());
        }
        Ok(request)
    }

    fn evaluation(&self, base: &[u8], edit: &TaskEdit, name: String) -> Result<AssembledArchive> {
        let request = self.plan_evaluation(base, edit)?;
        assembly::build(base, &request, &self.layouts.evaluation, name)
    }

    fn template(&self, base: &[u8], edit: &TaskEdit, name: String) -> Result<AssembledArchive> {
        let request = self.plan_template(base, edit)?;
        assembly::build(base, &request, &self.layouts.template, name)
    }
}

fn setup_path(layout: &PackageLayout, kind: PackageKind) -> Result<&str> {
    layout
        .setup_file
        .as_deref()
        .ok_or(PackageError::NoSetupFile { kind })
}

fn partial(failed: PackageKind, source: PackageError) -> PackageError {
    warn!(%failed, error = %source, "task package assembly failed for one archive");
    PackageError::PartialAssemblyFailure {
        failed,
        source: Box::new(source),
    }
}
