use thiserror::Error;

use super::stage::Stage;
use crate::db::DatabaseError;
use crate::error::ValidationError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid job: {0}")]
    Validation(#[from] ValidationError),

    /// The job record could not be written. The in-memory job keeps its last
    /// persisted status.
    #[error("Failed to persist job state: {0}")]
    Persistence(#[from] DatabaseError),

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error("Job {job_id} cancelled at the {stage} stage")]
    Cancelled { job_id: String, stage: Stage },

    #[error("Orchestrator has been cancelled and accepts no new jobs")]
    ShutDown,
}

/// A named stage failed; `message` is what gets recorded on the job.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{stage} stage failed: {message}")]
pub struct StageError {
    pub stage: Stage,
    pub message: String,
}

impl StageError {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}
