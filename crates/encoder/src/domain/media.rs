use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::ValidationError;

/// The source asset a job encodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Media {
    /// Unique media identifier (UUID).
    pub id: String,
    /// Key of the source object in the input bucket.
    pub resource_locator: String,
    /// Where the acquire stage staged the source file.
    pub local_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
}

impl Media {
    pub fn new(resource_locator: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            resource_locator: resource_locator.into(),
            local_path: None,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if uuid::Uuid::parse_str(&self.id).is_err() {
            return Err(ValidationError::InvalidId {
                field: "media.id",
                value: self.id.clone(),
            });
        }
        if self.resource_locator.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "media.resource_locator",
            });
        }
        Ok(())
    }
}
