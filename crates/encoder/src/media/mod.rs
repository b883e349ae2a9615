//! Media stages: the per-job work the orchestrator sequences around
//! distribution.

pub mod toolkit;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::Media;
use crate::error::StorageError;

pub use toolkit::ToolkitStages;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("{0}")]
    Failed(String),

    #[error("Transfer failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to run '{program}': {source}")]
    Command {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MediaError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        MediaError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// The four media stages of a job. Distribution is not part of this seam;
/// the orchestrator runs it through the transfer pool.
pub trait MediaStages: Send + Sync {
    /// Fetches the source into the staging root and returns its local path.
    fn acquire(&self, media: &Media) -> Result<PathBuf, MediaError>;

    fn fragment(&self, media: &Media) -> Result<(), MediaError>;

    fn transform(&self, media: &Media) -> Result<(), MediaError>;

    /// Removes intermediates left behind by the earlier stages.
    fn finish(&self, media: &Media) -> Result<(), MediaError>;
}
