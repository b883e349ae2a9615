use std::path::PathBuf;

use crate::config::EncoderConfig;

/// The slice of `EncoderConfig` the orchestrator needs for distribution.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Bucket used by `JobOrchestrator::submit`.
    pub output_bucket: String,
    /// Root under which the transform stage leaves `<media id>/`.
    pub staging_root: PathBuf,
    pub concurrency: usize,
}

impl TransferConfig {
    pub fn new(
        output_bucket: impl Into<String>,
        staging_root: impl Into<PathBuf>,
        concurrency: usize,
    ) -> Self {
        Self {
            output_bucket: output_bucket.into(),
            staging_root: staging_root.into(),
            concurrency,
        }
    }

    pub fn from_config(config: &EncoderConfig) -> Self {
        Self::new(
            config.output_bucket.clone(),
            config.local_storage_dir(),
            config.concurrency,
        )
    }
}
