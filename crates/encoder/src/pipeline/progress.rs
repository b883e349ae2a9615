use crate::broadcast::{JobProgressBroadcaster, JobProgressEvent};
use crate::domain::JobStatus;

/// Events emitted by the orchestrator after each persisted transition.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Transition {
        job_id: String,
        resource_locator: String,
        status: JobStatus,
        message: String,
    },
    Completed {
        job_id: String,
        resource_locator: String,
        output_path: String,
    },
    Failed {
        job_id: String,
        resource_locator: String,
        error: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter, the orchestrator's default.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Bridges orchestrator events to a `JobProgressBroadcaster` channel.
pub struct BroadcastProgress {
    broadcaster: JobProgressBroadcaster,
}

impl BroadcastProgress {
    pub fn new(broadcaster: JobProgressBroadcaster) -> Self {
        Self { broadcaster }
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, event: ProgressEvent) {
        let event = match event {
            ProgressEvent::Transition {
                job_id,
                resource_locator,
                status,
                message,
            } => JobProgressEvent::new(&job_id, &resource_locator, status, &message),
            ProgressEvent::Completed {
                job_id,
                resource_locator,
                output_path,
            } => JobProgressEvent::completed(&job_id, &resource_locator, &output_path),
            ProgressEvent::Failed {
                job_id,
                resource_locator,
                error,
            } => JobProgressEvent::failed(&job_id, &resource_locator, &error),
        };
        self.broadcaster.send(event);
    }
}
