pub mod assembly;
pub mod config;
pub mod error;
pub mod layout;
pub mod naming;
pub mod reader;
pub mod rebuild;
pub mod request;
pub mod service;
pub mod submission;
pub mod task;
pub mod upload;
pub mod view;

pub use assembly::AssembledArchive;
pub use config::AppConfig;
pub use error::{PackageError, Result};
pub use layout::{PackageKind, PackageLayout, PackageLayouts};
pub use reader::ArchiveReader;
pub use rebuild::{rebuild, rebuild_bytes, rebuild_file};
pub use request::MutationRequest;
pub use service::{PackageService, TaskArchives};
pub use submission::{SubmissionAssembler, SubmissionEdit, resubmission_description};
pub use task::{TaskAssembler, TaskEdit, TaskPackages};
pub use upload::{UploadError, UploadedFile};
pub use view::{PackageContents, PackageView};
