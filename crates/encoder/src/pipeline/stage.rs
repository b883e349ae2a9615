use std::fmt;

use crate::domain::JobStatus;

/// One unit of pipeline work, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Acquire,
    Fragment,
    Transform,
    Distribute,
    Finish,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Acquire,
        Stage::Fragment,
        Stage::Transform,
        Stage::Distribute,
        Stage::Finish,
    ];

    /// Status a job carries while this stage runs.
    pub fn status(&self) -> JobStatus {
        match self {
            Stage::Acquire => JobStatus::Acquiring,
            Stage::Fragment => JobStatus::Fragmenting,
            Stage::Transform => JobStatus::Transforming,
            Stage::Distribute => JobStatus::Distributing,
            Stage::Finish => JobStatus::Finishing,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Acquire => "acquire",
            Stage::Fragment => "fragment",
            Stage::Transform => "transform",
            Stage::Distribute => "distribute",
            Stage::Finish => "finish",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
