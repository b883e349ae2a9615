pub mod config;
pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod stage;

pub use config::TransferConfig;
pub use error::{PipelineError, StageError};
pub use orchestrator::JobOrchestrator;
pub use progress::{BroadcastProgress, NoopProgress, ProgressEvent, ProgressReporter};
pub use stage::Stage;
