//! Broadcasting of job progress for real-time streaming to any subscriber.

pub mod job_progress;

pub use job_progress::{JobProgressBroadcaster, JobProgressEvent};
