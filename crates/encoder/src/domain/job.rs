use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::media::Media;
use crate::error::ValidationError;

/// Pipeline state of a job.
///
/// The happy path runs in declaration order from `Pending` to `Completed`.
/// `Failed` is reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Acquiring,
    Fragmenting,
    Transforming,
    Distributing,
    Finishing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Acquiring => "acquiring",
            JobStatus::Fragmenting => "fragmenting",
            JobStatus::Transforming => "transforming",
            JobStatus::Distributing => "distributing",
            JobStatus::Finishing => "finishing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// The transition table.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;

        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (_, Failed)
                | (Pending, Acquiring)
                | (Acquiring, Fragmenting)
                | (Fragmenting, Transforming)
                | (Transforming, Distributing)
                | (Distributing, Finishing)
                | (Finishing, Completed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "acquiring" => Ok(JobStatus::Acquiring),
            "fragmenting" => Ok(JobStatus::Fragmenting),
            "transforming" => Ok(JobStatus::Transforming),
            "distributing" => Ok(JobStatus::Distributing),
            "finishing" => Ok(JobStatus::Finishing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    pub media: Media,
    /// Destination bucket for the encoded output.
    pub output_bucket_path: String,
    /// Error message, only set once the job has failed.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(media: Media, output_bucket_path: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            status: JobStatus::Pending,
            media,
            output_bucket_path: output_bucket_path.into(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if uuid::Uuid::parse_str(&self.id).is_err() {
            return Err(ValidationError::InvalidId {
                field: "job.id",
                value: self.id.clone(),
            });
        }
        if self.output_bucket_path.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "job.output_bucket_path",
            });
        }
        self.media.validate()
    }

    /// Returns a copy of this job moved to `next`, leaving `self` untouched
    /// so callers can keep the last persisted state until a write succeeds.
    pub fn advanced(&self, next: JobStatus) -> Result<Job, ValidationError> {
        if !self.status.can_transition_to(next) {
            return Err(ValidationError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        let mut job = self.clone();
        job.status = next;
        job.updated_at = Utc::now();
        Ok(job)
    }

    /// Returns a failed copy of this job carrying `message`.
    pub fn failed(&self, message: impl Into<String>) -> Result<Job, ValidationError> {
        let mut job = self.advanced(JobStatus::Failed)?;
        job.error = Some(message.into());
        Ok(job)
    }
}
