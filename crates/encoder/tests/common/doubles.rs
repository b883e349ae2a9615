//! Test doubles for the orchestrator's seams.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use encoder::db::{DatabaseError, JobRepository};
use encoder::domain::{Job, JobStatus, Media};
use encoder::error::StorageError;
use encoder::media::{MediaError, MediaStages};
use encoder::storage::{FilesystemStore, TransferStore};

/// In-memory `JobRepository` that records every update attempt and can be
/// told to reject writes of a given status.
pub struct RecordingRepository {
    jobs: Mutex<HashMap<String, Job>>,
    attempts: Mutex<Vec<JobStatus>>,
    persisted: Mutex<Vec<JobStatus>>,
    fail_on: Mutex<Option<JobStatus>>,
}

impl RecordingRepository {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            attempts: Mutex::new(Vec::new()),
            persisted: Mutex::new(Vec::new()),
            fail_on: Mutex::new(None),
        }
    }

    /// Every subsequent update to `status` fails as if the store were down.
    pub fn fail_update_on(&self, status: JobStatus) {
        *self.fail_on.lock().unwrap() = Some(status);
    }

    /// Statuses of every update call, successful or not.
    pub fn attempts(&self) -> Vec<JobStatus> {
        self.attempts.lock().unwrap().clone()
    }

    /// Statuses of every update that was stored.
    pub fn persisted(&self) -> Vec<JobStatus> {
        self.persisted.lock().unwrap().clone()
    }

    pub fn stored(&self, id: &str) -> Option<Job> {
        self.jobs.lock().unwrap().get(id).cloned()
    }
}

impl JobRepository for RecordingRepository {
    fn insert(&self, job: &Job) -> Result<Job, DatabaseError> {
        let mut jobs = self.jobs.lock().unwrap();
        if jobs.contains_key(&job.id) {
            return Err(DatabaseError::Conflict {
                entity: "job",
                id: job.id.clone(),
                reason: "already exists".to_string(),
            });
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(job.clone())
    }

    fn find(&self, id: &str) -> Result<Job, DatabaseError> {
        self.stored(id).ok_or_else(|| DatabaseError::NotFound {
            entity: "job",
            id: id.to_string(),
        })
    }

    fn update(&self, job: &Job) -> Result<Job, DatabaseError> {
        self.attempts.lock().unwrap().push(job.status);

        if *self.fail_on.lock().unwrap() == Some(job.status) {
            return Err(DatabaseError::Io {
                path: PathBuf::from("jobs.db"),
                source: std::io::Error::new(std::io::ErrorKind::Other, "store unreachable"),
            });
        }

        let mut jobs = self.jobs.lock().unwrap();
        if !jobs.contains_key(&job.id) {
            return Err(DatabaseError::NotFound {
                entity: "job",
                id: job.id.clone(),
            });
        }
        jobs.insert(job.id.clone(), job.clone());
        self.persisted.lock().unwrap().push(job.status);
        Ok(job.clone())
    }
}

/// `MediaStages` that records its calls, stages fake files and fails on
/// request with a fixed message.
pub struct ScriptedStages {
    staging: PathBuf,
    output_files: usize,
    failures: Mutex<HashMap<&'static str, String>>,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedStages {
    pub fn new(staging: &Path, output_files: usize) -> Self {
        Self {
            staging: staging.to_path_buf(),
            output_files,
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Makes `stage` ("acquire", "fragment", "transform" or "finish") fail
    /// with `message`.
    pub fn fail_at(&self, stage: &'static str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(stage, message.to_string());
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn enter(&self, stage: &'static str) -> Result<(), MediaError> {
        self.calls.lock().unwrap().push(stage);
        match self.failures.lock().unwrap().get(stage) {
            Some(message) => Err(MediaError::Failed(message.clone())),
            None => Ok(()),
        }
    }
}

impl MediaStages for ScriptedStages {
    fn acquire(&self, media: &Media) -> Result<PathBuf, MediaError> {
        self.enter("acquire")?;
        std::fs::create_dir_all(&self.staging).unwrap();
        let path = self.staging.join(format!("{}.mp4", media.id));
        std::fs::write(&path, b"source").unwrap();
        Ok(path)
    }

    fn fragment(&self, _media: &Media) -> Result<(), MediaError> {
        self.enter("fragment")
    }

    fn transform(&self, media: &Media) -> Result<(), MediaError> {
        self.enter("transform")?;
        let out = self.staging.join(&media.id);
        std::fs::create_dir_all(out.join("video")).unwrap();
        for i in 0..self.output_files {
            let path = if i % 2 == 0 {
                out.join(format!("seg-{}.m4s", i))
            } else {
                out.join("video").join(format!("seg-{}.m4s", i))
            };
            std::fs::write(path, format!("segment {}", i)).unwrap();
        }
        Ok(())
    }

    fn finish(&self, _media: &Media) -> Result<(), MediaError> {
        self.enter("finish")
    }
}

/// `FilesystemStore` that rejects uploads whose key contains a marker,
/// optionally slows every put down, and counts every put.
pub struct FlakyStore {
    inner: FilesystemStore,
    fail_marker: Option<String>,
    delay: Duration,
    started: AtomicBool,
    puts: AtomicUsize,
}

impl FlakyStore {
    pub fn new(root: &Path) -> Self {
        Self {
            inner: FilesystemStore::new(root),
            fail_marker: None,
            delay: Duration::ZERO,
            started: AtomicBool::new(false),
            puts: AtomicUsize::new(0),
        }
    }

    pub fn slow(root: &Path, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new(root)
        }
    }

    /// True once the first upload has begun.
    pub fn has_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn failing_on(root: &Path, marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Self::new(root)
        }
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

impl TransferStore for FlakyStore {
    fn put(&self, local_path: &Path, remote_key: &str) -> Result<(), StorageError> {
        self.started.store(true, Ordering::SeqCst);
        self.puts.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        if let Some(marker) = &self.fail_marker {
            if remote_key.contains(marker.as_str()) {
                return Err(StorageError::NotFound(format!("bucket refused {}", remote_key)));
            }
        }
        self.inner.put(local_path, remote_key)
    }

    fn get(&self, remote_key: &str, local_path: &Path) -> Result<(), StorageError> {
        self.inner.get(remote_key, local_path)
    }
}
