//! Job progress broadcaster for real-time job status streaming.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::domain::JobStatus;

/// Progress event for a job, emitted once per persisted transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgressEvent {
    /// Unique job identifier.
    pub job_id: String,
    /// Source object being encoded.
    pub resource_locator: String,
    pub status: JobStatus,
    /// Human-readable message describing current activity.
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Remote prefix the encoded output was uploaded under (set on completion).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    /// Error message (set on failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobProgressEvent {
    pub fn new(job_id: &str, resource_locator: &str, status: JobStatus, message: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            resource_locator: resource_locator.to_string(),
            status,
            message: message.to_string(),
            timestamp: Utc::now(),
            output_path: None,
            error: None,
        }
    }

    pub fn completed(job_id: &str, resource_locator: &str, output_path: &str) -> Self {
        Self {
            output_path: Some(output_path.to_string()),
            ..Self::new(
                job_id,
                resource_locator,
                JobStatus::Completed,
                "Encoding completed successfully",
            )
        }
    }

    pub fn failed(job_id: &str, resource_locator: &str, error: &str) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(job_id, resource_locator, JobStatus::Failed, "Encoding failed")
        }
    }
}

/// Broadcasts job progress events for streaming.
#[derive(Clone)]
pub struct JobProgressBroadcaster {
    sender: Arc<broadcast::Sender<JobProgressEvent>>,
}

impl JobProgressBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends a progress event to all subscribers.
    pub fn send(&self, event: JobProgressEvent) {
        // No active receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobProgressEvent> {
        self.sender.subscribe()
    }
}

impl Default for JobProgressBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}
