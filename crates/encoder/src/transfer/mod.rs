//! Bulk upload of a staged directory through a bounded pool of workers.

pub mod error;
pub mod outcome;
pub mod pool;
pub mod scanner;

pub use error::TransferError;
pub use outcome::{TransferOutcome, TransferReport};
pub use pool::TransferWorkerPool;
pub use scanner::{discover_files, remote_key_for, TransferTask};
