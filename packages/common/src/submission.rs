use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Grading state of a submission.
///
/// Persisted as a single-letter code (`Q`, `R`, `E`, `D`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmissionStatus {
    /// Handed to the grading backend, waiting for a runner.
    #[default]
    #[serde(rename = "Q")]
    Queued,
    #[serde(rename = "R")]
    Running,
    /// The runner failed to grade the submission.
    #[serde(rename = "E")]
    Error,
    /// Graded; points and notes are available.
    #[serde(rename = "D")]
    Done,
}

impl SubmissionStatus {
    pub const ALL: &'static [SubmissionStatus] =
        &[Self::Queued, Self::Running, Self::Error, Self::Done];

    /// Returns true while the grading backend still owns the submission.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Queued => "Q",
            Self::Running => "R",
            Self::Error => "E",
            Self::Done => "D",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::Running => "Running",
            Self::Error => "Error",
            Self::Done => "Done",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    invalid: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid submission status '{}'. Valid codes: Q, R, E, D",
            self.invalid
        )
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for SubmissionStatus {
    type Err = ParseStatusError;

    /// Accepts either the stored code or the display label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.code() == s || status.label() == s)
            .ok_or_else(|| ParseStatusError {
                invalid: s.to_string(),
            })
    }
}
