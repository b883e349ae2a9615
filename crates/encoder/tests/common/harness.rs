//! Test harness for isolated orchestrator runs.
//!
//! Each `TestHarness` owns a temp directory holding a staging root and a
//! filesystem-backed remote namespace.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use encoder::domain::{Job, Media};
use encoder::pipeline::{JobOrchestrator, TransferConfig};

use super::doubles::{FlakyStore, RecordingRepository, ScriptedStages};

pub const OUTPUT_BUCKET: &str = "encoded-videos";

pub struct TestHarness {
    temp_dir: TempDir,
    pub staging: PathBuf,
    pub remote: PathBuf,
    pub repository: Arc<RecordingRepository>,
    pub stages: Arc<ScriptedStages>,
    pub store: Arc<FlakyStore>,
}

impl TestHarness {
    /// A harness whose transform stage produces `output_files` files.
    pub fn new(output_files: usize) -> Self {
        Self::build(output_files, FlakyStore::new)
    }

    /// Like `new`, but every upload takes at least `delay`.
    pub fn with_slow_upload(output_files: usize, delay: Duration) -> Self {
        Self::build(output_files, |remote| FlakyStore::slow(remote, delay))
    }

    /// Like `new`, but uploads of keys containing `marker` fail.
    pub fn with_failing_upload(output_files: usize, marker: &str) -> Self {
        Self::build(output_files, |remote| FlakyStore::failing_on(remote, marker))
    }

    fn build(output_files: usize, store: impl FnOnce(&Path) -> FlakyStore) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let staging = temp_dir.path().join("staging");
        let remote = temp_dir.path().join("remote");

        let store = store(&remote);

        Self {
            stages: Arc::new(ScriptedStages::new(&staging, output_files)),
            repository: Arc::new(RecordingRepository::new()),
            store: Arc::new(store),
            staging,
            remote,
            temp_dir,
        }
    }

    pub fn orchestrator(&self, concurrency: usize) -> JobOrchestrator {
        JobOrchestrator::new(
            self.repository.clone(),
            self.stages.clone(),
            self.store.clone(),
            TransferConfig::new(OUTPUT_BUCKET, &self.staging, concurrency),
        )
    }

    /// Creates a pending job through `orchestrator`.
    pub fn pending_job(&self, orchestrator: &JobOrchestrator) -> Job {
        orchestrator
            .create_job(Media::new("uploads/keynote.mp4"), OUTPUT_BUCKET)
            .expect("Failed to create job")
    }

    /// Where an uploaded file for `job` lands in the remote namespace.
    pub fn remote_object(&self, job: &Job, relative: &str) -> PathBuf {
        self.remote
            .join(OUTPUT_BUCKET)
            .join(&job.media.id)
            .join(relative)
    }
}
