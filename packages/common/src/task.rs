use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-task limits handed to the grading backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Submissions a student may make per day. Zero means unlimited.
    pub daily_submission_limit: u16,
    /// Largest accepted upload, in KB.
    pub max_upload_size: u64,
    /// Wall-clock run time limit, in seconds.
    pub run_time_limit: u32,
    /// Memory limit, in KB.
    pub memory_limit: u64,
    /// Cluster partition the job should run on.
    pub partition: Option<String>,
    /// Cluster GPU request (e.g. "1", "a100:1").
    pub gpus: Option<String>,
}

impl ResourceLimits {
    pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 5 * 1024;
    pub const DEFAULT_DAILY_SUBMISSION_LIMIT: u16 = 3;
    pub const DEFAULT_RUN_TIME_LIMIT: u32 = 60;
    pub const DEFAULT_MEMORY_LIMIT: u64 = 1_048_576;

    /// Whether `submitted_today` more submissions exhaust the daily quota.
    pub fn submissions_exceeded(&self, submitted_today: u32) -> bool {
        self.daily_submission_limit != 0
            && submitted_today >= u32::from(self.daily_submission_limit)
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            daily_submission_limit: Self::DEFAULT_DAILY_SUBMISSION_LIMIT,
            max_upload_size: Self::DEFAULT_MAX_UPLOAD_SIZE,
            run_time_limit: Self::DEFAULT_RUN_TIME_LIMIT,
            memory_limit: Self::DEFAULT_MEMORY_LIMIT,
            partition: None,
            gpus: None,
        }
    }
}

/// Where a task stands relative to its schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Not opened yet.
    Scheduled,
    Open,
    /// Past the deadline but still accepting (late) submissions.
    Ended,
    /// No longer accepting submissions.
    Closed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Open => "Open",
            Self::Ended => "Ended",
            Self::Closed => "Closed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Submission window of a task. Every bound is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskWindow {
    pub opened_at: Option<DateTime<Utc>>,
    pub deadline_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl TaskWindow {
    /// The deadline submissions are judged late against; falls back to the
    /// closing time.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline_at.or(self.closed_at)
    }

    pub fn is_late(&self, now: DateTime<Utc>) -> bool {
        self.deadline_at.is_some_and(|d| d < now)
    }

    pub fn is_closed(&self, now: DateTime<Utc>) -> bool {
        self.closed_at.is_some_and(|c| c < now)
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        if self.opened_at.is_some_and(|o| o > now) {
            return false;
        }
        !self.is_closed(now)
    }

    pub fn status(&self, now: DateTime<Utc>) -> TaskStatus {
        if self.is_closed(now) {
            TaskStatus::Closed
        } else if self.is_late(now) {
            TaskStatus::Ended
        } else if self.is_open(now) {
            TaskStatus::Open
        } else {
            TaskStatus::Scheduled
        }
    }

    /// Whether a submission made at `submitted_at` counts as late.
    pub fn is_late_submission(&self, submitted_at: DateTime<Utc>) -> bool {
        self.deadline().is_some_and(|d| submitted_at > d)
    }
}
