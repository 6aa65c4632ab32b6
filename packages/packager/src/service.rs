use std::sync::Arc;

use common::{ArchiveRef, ArchiveStore, ResourceLimits, StorageError};
use tracing::{debug, info, instrument};

use crate::assembly::AssembledArchive;
use crate::error::Result;
use crate::layout::{PackageKind, PackageLayouts};
use crate::naming::upload_archive_name;
use crate::reader::ArchiveReader;
use crate::submission::{SubmissionAssembler, SubmissionEdit};
use crate::task::{TaskAssembler, TaskEdit};
use crate::upload::{UploadedFile, validate_submission_upload, validate_task_upload};
use crate::view::{PackageContents, PackageView};

/// References to a task's freshly stored packages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskArchives {
    pub evaluation: ArchiveRef,
    pub template: ArchiveRef,
}

/// Runs the package engine against an [`ArchiveStore`].
///
/// Returns references to stored archives; recording them on the owning
/// task or submission is up to the caller.
pub struct PackageService<S> {
    store: Arc<S>,
    layouts: PackageLayouts,
}

impl<S: ArchiveStore> PackageService<S> {
    pub fn new(store: Arc<S>, layouts: PackageLayouts) -> Self {
        Self { store, layouts }
    }

    pub fn layouts(&self) -> &PackageLayouts {
        &self.layouts
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Bytes of a stored archive. `None` if there is no reference or the
    /// blob is gone.
    pub async fn load(&self, archive: Option<&ArchiveRef>) -> Result<Option<Vec<u8>>> {
        let Some(archive) = archive else {
            return Ok(None);
        };
        match self.store.read(&archive.hash).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(StorageError::NotFound(_)) => {
                debug!(name = %archive.name, hash = %archive.hash, "archive missing from store");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Like [`load`](Self::load), but also `None` unless the archive is a
    /// well-formed package of `kind`.
    pub async fn load_valid(
        &self,
        archive: Option<&ArchiveRef>,
        kind: PackageKind,
    ) -> Result<Option<Vec<u8>>> {
        let Some(bytes) = self.load(archive).await? else {
            return Ok(None);
        };
        let main = &self.layouts.get(kind).main_file;
        match ArchiveReader::open_and_validate_bytes(&bytes, main) {
            Ok(_) => Ok(Some(bytes)),
            Err(e) if e.is_unusable_archive() => {
                debug!(%kind, error = %e, "stored archive unusable as a base");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Default archive for `kind`: the configured skeleton file, or a
    /// generated archive with an empty main file.
    pub async fn skeleton(&self, kind: PackageKind) -> Result<Vec<u8>> {
        let layout = self.layouts.get(kind);
        match &layout.skeleton {
            Some(path) => Ok(tokio::fs::read(path).await?),
            None => layout.generated_skeleton(),
        }
    }

    /// What an edit form shows for a stored package. Unusable archives read
    /// as empty.
    pub async fn contents(
        &self,
        archive: Option<&ArchiveRef>,
        kind: PackageKind,
    ) -> Result<PackageContents> {
        let bytes = self.load(archive).await?;
        PackageView::new(bytes.as_deref(), self.layouts.get(kind)).contents()
    }

    /// Base for an inline submission edit: the previous submission, else the
    /// task template, else the submission skeleton.
    pub async fn submission_base(
        &self,
        previous: Option<&ArchiveRef>,
        template: Option<&ArchiveRef>,
    ) -> Result<Vec<u8>> {
        if let Some(bytes) = self.load_valid(previous, PackageKind::Submission).await? {
            return Ok(bytes);
        }
        if let Some(bytes) = self.load_valid(template, PackageKind::Template).await? {
            return Ok(bytes);
        }
        self.skeleton(PackageKind::Submission).await
    }

    #[instrument(skip(self, previous, template, edit))]
    pub async fn submit_code(
        &self,
        previous: Option<&ArchiveRef>,
        template: Option<&ArchiveRef>,
        edit: &SubmissionEdit,
        files_allowed: bool,
    ) -> Result<ArchiveRef> {
        let base = self.submission_base(previous, template).await?;
        let archive = SubmissionAssembler::new(&self.layouts.submission)
            .files_allowed(files_allowed)
            .assemble(&base, edit)?;
        self.store_archive(archive).await
    }

    #[instrument(skip_all)]
    pub async fn submit_upload(
        &self,
        file: Option<&UploadedFile>,
        limits: &ResourceLimits,
    ) -> Result<ArchiveRef> {
        let file =
            validate_submission_upload(file, limits.max_upload_size, &self.layouts.submission)?;
        self.store_archive(uploaded_archive(file)).await
    }

    #[instrument(skip_all)]
    pub async fn upload_task_package(&self, file: Option<&UploadedFile>) -> Result<ArchiveRef> {
        let file = validate_task_upload(file, &self.layouts.evaluation)?;
        self.store_archive(uploaded_archive(file)).await
    }

    /// Rebuild and store both packages of a task. Nothing is stored unless
    /// both archives were built.
    #[instrument(skip(self, evaluation, template, edit))]
    pub async fn edit_task(
        &self,
        task_name: &str,
        evaluation: Option<&ArchiveRef>,
        template: Option<&ArchiveRef>,
        edit: &TaskEdit,
    ) -> Result<TaskArchives> {
        let evaluation_base = match self.load_valid(evaluation, PackageKind::Evaluation).await? {
            Some(bytes) => bytes,
            None => self.skeleton(PackageKind::Evaluation).await?,
        };
        let template_base = match self.load_valid(template, PackageKind::Template).await? {
            Some(bytes) => bytes,
            None => self.skeleton(PackageKind::Template).await?,
        };

        let packages = TaskAssembler::new(&self.layouts).assemble(
            task_name,
            edit,
            &evaluation_base,
            &template_base,
        )?;

        Ok(TaskArchives {
            evaluation: self.store_archive(packages.evaluation).await?,
            template: self.store_archive(packages.template).await?,
        })
    }

    async fn store_archive(&self, archive: AssembledArchive) -> Result<ArchiveRef> {
        let hash = self.store.put(&archive.bytes).await?;
        info!(name = %archive.name, %hash, size = archive.size(), "archive stored");
        Ok(ArchiveRef {
            size: archive.size(),
            name: archive.name,
            hash,
        })
    }
}

fn uploaded_archive(file: &UploadedFile) -> AssembledArchive {
    AssembledArchive::new(upload_archive_name(&file.name), file.content.clone())
}
