use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::storage::ContentHash;
use crate::submission::SubmissionStatus;
use crate::task::{ResourceLimits, TaskWindow};

/// A stored archive as the persistence layer records it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRef {
    /// Download file name, e.g. "brave_hopper.zip".
    pub name: String,
    /// Storage key and integrity hash of the archive bytes.
    pub hash: ContentHash,
    /// Archive size in bytes.
    pub size: u64,
}

/// Everything the grading backend needs to know about a task.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: i64,
    pub name: String,
    /// Evaluation package.
    pub archive: ArchiveRef,
    /// Submission template package, if the task ships one.
    pub template: Option<ArchiveRef>,
    pub limits: ResourceLimits,
    pub window: TaskWindow,
    pub leaderboard: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmissionSnapshot {
    pub id: i64,
    pub task_id: i64,
    pub user_id: i64,
    pub description: Option<String>,
    pub archive: ArchiveRef,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
}

/// One request to grade a submission against a task.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvaluationJob {
    pub job_id: String,
    pub task: TaskSnapshot,
    pub submission: SubmissionSnapshot,
}

impl EvaluationJob {
    pub fn new(task: TaskSnapshot, submission: SubmissionSnapshot) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            task,
            submission,
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("evaluation queue is closed")]
    Closed,

    #[error("dispatch failed: {0}")]
    Backend(String),
}

/// Hands submissions to the external grading backend.
///
/// Fire-and-forget: success means the job was accepted for delivery, not that
/// it was graded.
#[async_trait]
pub trait EvaluationDispatcher: Send + Sync {
    async fn submit_for_evaluation(&self, job: EvaluationJob) -> Result<(), DispatchError>;
}

/// In-process dispatcher backed by an unbounded tokio channel.
#[derive(Clone)]
pub struct ChannelDispatcher {
    tx: mpsc::UnboundedSender<EvaluationJob>,
}

impl ChannelDispatcher {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<EvaluationJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EvaluationDispatcher for ChannelDispatcher {
    async fn submit_for_evaluation(&self, job: EvaluationJob) -> Result<(), DispatchError> {
        let job_id = job.job_id.clone();
        let submission_id = job.submission.id;
        self.tx.send(job).map_err(|_| DispatchError::Closed)?;
        info!(job_id = %job_id, submission_id, "Submission queued for evaluation");
        Ok(())
    }
}
