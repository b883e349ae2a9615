use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, SendError, Sender};
use log::{debug, error, info, warn};

use super::error::TransferError;
use super::outcome::{TransferOutcome, TransferReport};
use super::scanner::{discover_files, TransferTask};
use crate::storage::TransferStore;

const CANCELLED: &str = "transfer cancelled";
const NO_WORKERS: &str = "no upload worker available";
const WORKER_LOST: &str = "upload worker terminated before reporting";

/// Uploads a staged directory to a `TransferStore` with a fixed number of
/// worker threads.
///
/// Every call blocks until all workers have been joined, so the returned
/// report always holds exactly one outcome per discovered file.
pub struct TransferWorkerPool {
    store: Arc<dyn TransferStore>,
    shutdown: Arc<AtomicBool>,
}

impl TransferWorkerPool {
    pub fn new(store: Arc<dyn TransferStore>) -> Self {
        Self::with_shutdown(store, Arc::new(AtomicBool::new(false)))
    }

    /// Creates a pool that observes an externally owned shutdown flag.
    pub fn with_shutdown(store: Arc<dyn TransferStore>, shutdown: Arc<AtomicBool>) -> Self {
        Self { store, shutdown }
    }

    /// Stops dispatching new files. Uploads already in flight finish; files
    /// not yet started are reported as cancelled.
    pub fn shutdown(&self) {
        info!("Shutting down upload pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Uploads every regular file under `local_root` to `target`, using at
    /// most `concurrency` workers (at least one).
    pub fn upload(
        &self,
        local_root: &Path,
        target: &str,
        concurrency: usize,
    ) -> Result<TransferReport, TransferError> {
        let tasks = discover_files(local_root, target)?;
        self.upload_tasks(tasks, concurrency)
    }

    pub fn upload_tasks(
        &self,
        tasks: Vec<TransferTask>,
        concurrency: usize,
    ) -> Result<TransferReport, TransferError> {
        if tasks.is_empty() {
            return Ok(TransferReport::default());
        }

        let expected: Vec<(PathBuf, String)> = tasks
            .iter()
            .map(|t| (t.local_path.clone(), t.remote_key.clone()))
            .collect();
        let worker_count = concurrency.max(1).min(tasks.len());

        let (task_sender, task_receiver) = bounded::<TransferTask>(worker_count * 2);
        let (outcome_sender, outcome_receiver) = unbounded::<TransferOutcome>();

        let workers = self.spawn_workers(worker_count, &task_receiver, &outcome_sender)?;
        drop(task_receiver);
        drop(outcome_sender);

        info!(
            "Uploading {} files with {} workers",
            expected.len(),
            workers.len()
        );

        let mut undispatched = Vec::new();
        let mut reason = CANCELLED;
        let mut queue = tasks.into_iter();
        for task in queue.by_ref() {
            if self.is_shutdown() {
                undispatched.push(task);
                break;
            }
            if let Err(SendError(task)) = task_sender.send(task) {
                // Every worker has exited.
                reason = NO_WORKERS;
                undispatched.push(task);
                break;
            }
        }
        undispatched.extend(queue);
        drop(task_sender);

        for (i, worker) in workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Upload worker {} panicked: {:?}", i, e);
            } else {
                debug!("Upload worker {} finished", i);
            }
        }

        let mut outcomes: Vec<TransferOutcome> = outcome_receiver.try_iter().collect();

        if !undispatched.is_empty() {
            warn!("{} files were not dispatched: {}", undispatched.len(), reason);
        }
        outcomes.extend(undispatched.into_iter().map(|task| {
            TransferOutcome::failure(task.local_path, task.remote_key, reason.to_string())
        }));

        let reported: HashSet<PathBuf> = outcomes.iter().map(|o| o.local_path.clone()).collect();
        for (local_path, remote_key) in expected {
            if !reported.contains(&local_path) {
                outcomes.push(TransferOutcome::failure(
                    local_path,
                    remote_key,
                    WORKER_LOST.to_string(),
                ));
            }
        }

        let report = TransferReport::new(outcomes);
        info!(
            "Upload finished: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }

    fn spawn_workers(
        &self,
        worker_count: usize,
        task_receiver: &Receiver<TransferTask>,
        outcome_sender: &Sender<TransferOutcome>,
    ) -> Result<Vec<JoinHandle<()>>, TransferError> {
        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let task_rx = task_receiver.clone();
            let outcome_tx = outcome_sender.clone();
            let store = Arc::clone(&self.store);
            let shutdown_flag = Arc::clone(&self.shutdown);

            let spawned = thread::Builder::new()
                .name(format!("upload-worker-{}", worker_id))
                .spawn(move || run_worker(worker_id, task_rx, outcome_tx, store, shutdown_flag));

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) if workers.is_empty() => return Err(TransferError::SpawnFailed(e)),
                Err(e) => {
                    warn!(
                        "Could not spawn upload worker {} ({}), continuing with {}",
                        worker_id,
                        e,
                        workers.len()
                    );
                    break;
                }
            }
        }

        Ok(workers)
    }
}

fn run_worker(
    worker_id: usize,
    task_receiver: Receiver<TransferTask>,
    outcome_sender: Sender<TransferOutcome>,
    store: Arc<dyn TransferStore>,
    shutdown: Arc<AtomicBool>,
) {
    debug!("Upload worker {} started", worker_id);

    for task in task_receiver.iter() {
        let outcome = if shutdown.load(Ordering::Relaxed) {
            TransferOutcome::failure(task.local_path, task.remote_key, CANCELLED.to_string())
        } else {
            match store.put(&task.local_path, &task.remote_key) {
                Ok(()) => {
                    debug!("Worker {} uploaded {}", worker_id, task.remote_key);
                    TransferOutcome::success(task.local_path, task.remote_key)
                }
                Err(e) => {
                    warn!(
                        "Worker {} failed to upload {}: {}",
                        worker_id,
                        task.local_path.display(),
                        e
                    );
                    TransferOutcome::failure(task.local_path, task.remote_key, e.to_string())
                }
            }
        };

        if let Err(e) = outcome_sender.send(outcome) {
            error!("Upload worker {} failed to send outcome: {}", worker_id, e);
            break;
        }
    }

    debug!("Upload worker {} stopped", worker_id);
}
