pub mod config;
pub mod evaluation;
pub mod logging;
pub mod notes;
pub mod storage;
pub mod submission;
pub mod task;

pub use evaluation::{ArchiveRef, EvaluationDispatcher, EvaluationJob};
pub use storage::{ArchiveStore, ContentHash, FsArchiveStore, StorageError};
pub use submission::SubmissionStatus;
pub use task::{ResourceLimits, TaskStatus, TaskWindow};
