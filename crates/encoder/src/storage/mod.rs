//! Remote object namespace the pipeline downloads from and uploads to.

use std::path::Path;

use crate::error::StorageError;

pub mod filesystem;

pub use filesystem::FilesystemStore;

/// Put/get primitives against an object namespace keyed by `/`-separated
/// paths. Implementations are shared across upload worker threads.
pub trait TransferStore: Send + Sync {
    /// Uploads the file at `local_path` under `remote_key`, replacing any
    /// existing object.
    fn put(&self, local_path: &Path, remote_key: &str) -> Result<(), StorageError>;

    /// Downloads the object at `remote_key` into `local_path`.
    fn get(&self, remote_key: &str, local_path: &Path) -> Result<(), StorageError>;
}
