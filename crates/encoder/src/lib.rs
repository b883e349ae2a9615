pub mod broadcast;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod storage;
pub mod telemetry;
pub mod transfer;

pub use broadcast::{JobProgressBroadcaster, JobProgressEvent};
pub use config::{load_config, load_config_from_env, EncoderConfig, ToolkitConfig};
pub use db::{Database, DatabaseError, JobRepository, SqliteJobRepository};
pub use domain::{Job, JobStatus, Media};
pub use error::{ConfigError, EncoderError, Result, StorageError, ValidationError};
pub use media::{MediaError, MediaStages, ToolkitStages};
pub use pipeline::{JobOrchestrator, PipelineError, Stage, StageError, TransferConfig};
pub use storage::{FilesystemStore, TransferStore};
pub use telemetry::{init_logging, LoggingConfig};
pub use transfer::{TransferError, TransferOutcome, TransferReport, TransferWorkerPool};
