//! Records that flow through the encoding pipeline.

pub mod job;
pub mod media;

pub use job::{Job, JobStatus};
pub use media::Media;
