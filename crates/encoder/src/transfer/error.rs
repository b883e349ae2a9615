use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Upload root '{path}' is not readable: {source}")]
    MissingRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Upload root '{0}' is not a directory")]
    NotADirectory(PathBuf),

    #[error("Directory scan failed for '{path}': {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to spawn upload worker: {0}")]
    SpawnFailed(#[source] std::io::Error),

    /// One or more files did not reach the remote store.
    #[error("{failed} of {total} uploads failed: {message}")]
    Incomplete {
        failed: usize,
        total: usize,
        message: String,
    },
}
