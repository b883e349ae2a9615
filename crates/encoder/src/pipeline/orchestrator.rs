use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, info_span, warn};

use crate::config::EncoderConfig;
use crate::db::{Database, DatabaseError, JobRepository, SqliteJobRepository};
use crate::domain::{Job, JobStatus, Media};
use crate::error::{EncoderError, ValidationError};
use crate::media::{MediaStages, ToolkitStages};
use crate::storage::TransferStore;
use crate::transfer::TransferWorkerPool;

use super::config::TransferConfig;
use super::error::{PipelineError, StageError};
use super::progress::{NoopProgress, ProgressEvent, ProgressReporter};
use super::stage::Stage;

const CANCELLED_MESSAGE: &str = "job cancelled";
const DEFAULT_DATABASE_FILE: &str = "encoder.db";

/// Drives a job through acquire, fragment, transform, distribute and finish,
/// persisting every status change before acting on it.
pub struct JobOrchestrator {
    repository: Arc<dyn JobRepository>,
    stages: Arc<dyn MediaStages>,
    pool: TransferWorkerPool,
    transfer: TransferConfig,
    progress: Arc<dyn ProgressReporter>,
    shutdown: Arc<AtomicBool>,
}

impl JobOrchestrator {
    pub fn new(
        repository: Arc<dyn JobRepository>,
        stages: Arc<dyn MediaStages>,
        store: Arc<dyn TransferStore>,
        transfer: TransferConfig,
    ) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let pool = TransferWorkerPool::with_shutdown(store, Arc::clone(&shutdown));
        Self {
            repository,
            stages,
            pool,
            transfer,
            progress: Arc::new(NoopProgress),
            shutdown,
        }
    }

    /// Production constructor: SQLite job records (at `database_path`, or
    /// `encoder.db` under the staging root) and toolkit stages, all reading
    /// and writing through `store`.
    pub fn from_config(
        config: &EncoderConfig,
        store: Arc<dyn TransferStore>,
    ) -> Result<Self, EncoderError> {
        let database_path = config
            .database_path
            .as_ref()
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|| config.local_storage_dir().join(DEFAULT_DATABASE_FILE));
        let database = Database::open(&database_path)?;

        let stages = ToolkitStages::from_config(config, Arc::clone(&store));
        Ok(Self::new(
            Arc::new(SqliteJobRepository::new(database)),
            Arc::new(stages),
            store,
            TransferConfig::from_config(config),
        ))
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Requests cancellation. The running job fails with "job cancelled"
    /// before its next stage, or as soon as the current stage returns;
    /// uploads already in flight drain, queued ones are skipped.
    ///
    /// Cancellation is terminal: afterwards `create_job` and `submit` refuse
    /// new jobs with `PipelineError::ShutDown`.
    pub fn cancel(&self) {
        info!("Cancellation requested");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Validates and stores a new pending job for `media`.
    pub fn create_job(&self, media: Media, output_bucket: &str) -> Result<Job, PipelineError> {
        if self.is_cancelled() {
            return Err(PipelineError::ShutDown);
        }

        let job = Job::new(media, output_bucket);
        job.validate()?;

        let job = self
            .repository
            .insert(&job)
            .map_err(|e| persistence_failure(&job, JobStatus::Pending, e))?;

        info!(job_id = %job.id, media_id = %job.media.id, "Job created");
        self.progress.report(ProgressEvent::Transition {
            job_id: job.id.clone(),
            resource_locator: job.media.resource_locator.clone(),
            status: JobStatus::Pending,
            message: "Job queued for encoding".to_string(),
        });
        Ok(job)
    }

    /// `create_job` against the configured output bucket.
    pub fn submit(&self, media: Media) -> Result<Job, PipelineError> {
        let bucket = self.transfer.output_bucket.clone();
        self.create_job(media, &bucket)
    }

    /// Runs every stage of a pending job.
    ///
    /// On a stage failure the job is persisted as `failed` with the stage's
    /// message and `PipelineError::Stage` is returned. A persistence failure
    /// returns `PipelineError::Persistence` at once and leaves `job` at its
    /// last persisted status.
    pub fn run(&self, job: &mut Job) -> Result<(), PipelineError> {
        let _run_span = info_span!("job",
            job_id = %job.id,
            media_id = %job.media.id,
        )
        .entered();

        job.validate()?;
        if job.status != JobStatus::Pending {
            return Err(ValidationError::NotPending(job.status.to_string()).into());
        }

        for stage in Stage::ALL {
            let _stage_span = info_span!("stage", stage = %stage).entered();

            if self.is_cancelled() {
                warn!("Job cancelled before the {} stage", stage);
                return self.abort_cancelled(job, stage);
            }

            self.transition(job, stage.status())?;

            if let Err(e) = self.execute(stage, job) {
                if self.is_cancelled() {
                    warn!("Job cancelled during the {} stage: {}", stage, e.message);
                    return self.abort_cancelled(job, stage);
                }
                warn!("Stage {} failed: {}", stage, e.message);
                self.fail(job, &e.message)?;
                return Err(e.into());
            }
            debug!("Stage {} finished", stage);
        }

        self.transition(job, JobStatus::Completed)?;
        info!("Job completed");
        Ok(())
    }

    fn execute(&self, stage: Stage, job: &mut Job) -> Result<(), StageError> {
        let failed = |e: crate::media::MediaError| StageError::new(stage, e.to_string());

        match stage {
            Stage::Acquire => {
                let local_path = self.stages.acquire(&job.media).map_err(failed)?;
                debug!("Source staged at {}", local_path.display());
                job.media.local_path = Some(local_path);
                Ok(())
            }
            Stage::Fragment => self.stages.fragment(&job.media).map_err(failed),
            Stage::Transform => self.stages.transform(&job.media).map_err(failed),
            Stage::Distribute => self.distribute(job),
            Stage::Finish => self.stages.finish(&job.media).map_err(failed),
        }
    }

    fn distribute(&self, job: &Job) -> Result<(), StageError> {
        let local_root = self.transfer.staging_root.join(&job.media.id);
        let target = distribution_prefix(job);

        let report = self
            .pool
            .upload(&local_root, &target, self.transfer.concurrency)
            .map_err(|e| StageError::new(Stage::Distribute, e.to_string()))?;

        if report.is_success() {
            info!("Uploaded {} files under {}", report.total(), target);
            Ok(())
        } else {
            Err(StageError::new(Stage::Distribute, report.error_message()))
        }
    }

    /// Persists `job` moved to `next`. `job` is only replaced once the write
    /// has succeeded.
    fn transition(&self, job: &mut Job, next: JobStatus) -> Result<(), PipelineError> {
        let candidate = job.advanced(next)?;
        self.persist(job, candidate)
    }

    fn abort_cancelled(&self, job: &mut Job, stage: Stage) -> Result<(), PipelineError> {
        self.fail(job, CANCELLED_MESSAGE)?;
        Err(PipelineError::Cancelled {
            job_id: job.id.clone(),
            stage,
        })
    }

    fn fail(&self, job: &mut Job, message: &str) -> Result<(), PipelineError> {
        let candidate = job.failed(message)?;
        self.persist(job, candidate)
    }

    fn persist(&self, job: &mut Job, candidate: Job) -> Result<(), PipelineError> {
        if let Err(e) = self.repository.update(&candidate) {
            return Err(persistence_failure(&candidate, candidate.status, e));
        }
        *job = candidate;
        self.report(job);
        Ok(())
    }

    fn report(&self, job: &Job) {
        let job_id = job.id.clone();
        let resource_locator = job.media.resource_locator.clone();

        let event = match job.status {
            JobStatus::Completed => ProgressEvent::Completed {
                job_id,
                resource_locator,
                output_path: distribution_prefix(job),
            },
            JobStatus::Failed => ProgressEvent::Failed {
                job_id,
                resource_locator,
                error: job.error.clone().unwrap_or_default(),
            },
            status => ProgressEvent::Transition {
                job_id,
                resource_locator,
                status,
                message: format!("Job is {}", status),
            },
        };
        self.progress.report(event);
    }
}

/// Remote prefix a job's packaged output is uploaded under.
fn distribution_prefix(job: &Job) -> String {
    format!(
        "{}/{}",
        job.output_bucket_path.trim_end_matches('/'),
        job.media.id
    )
}

fn persistence_failure(job: &Job, status: JobStatus, e: DatabaseError) -> PipelineError {
    error!(
        alert = true,
        job_id = %job.id,
        status = %status,
        error = %e,
        "Failed to persist job state"
    );
    PipelineError::Persistence(e)
}
