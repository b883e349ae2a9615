use std::path::PathBuf;

use super::error::TransferError;

/// Result of one file's upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub local_path: PathBuf,
    pub remote_key: String,
    pub success: bool,
    pub error: Option<String>,
}

impl TransferOutcome {
    pub fn success(local_path: PathBuf, remote_key: String) -> Self {
        Self {
            local_path,
            remote_key,
            success: true,
            error: None,
        }
    }

    pub fn failure(local_path: PathBuf, remote_key: String, error: String) -> Self {
        Self {
            local_path,
            remote_key,
            success: false,
            error: Some(error),
        }
    }
}

/// Aggregated result of a bulk upload: one outcome per discovered file.
#[derive(Debug, Clone, Default)]
pub struct TransferReport {
    pub outcomes: Vec<TransferOutcome>,
}

impl TransferReport {
    pub fn new(outcomes: Vec<TransferOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Failure messages joined into one line, empty when everything succeeded.
    pub fn error_message(&self) -> String {
        self.outcomes
            .iter()
            .filter(|o| !o.success)
            .map(|o| {
                format!(
                    "{}: {}",
                    o.local_path.display(),
                    o.error.as_deref().unwrap_or("unknown error")
                )
            })
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn into_result(self) -> Result<TransferReport, TransferError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(TransferError::Incomplete {
                failed: self.failed(),
                total: self.total(),
                message: self.error_message(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(name: &str) -> TransferOutcome {
        TransferOutcome::success(PathBuf::from(name), format!("out/{}", name))
    }

    fn bad(name: &str, err: &str) -> TransferOutcome {
        TransferOutcome::failure(PathBuf::from(name), format!("out/{}", name), err.to_string())
    }

    #[test]
    fn test_empty_report_is_success() {
        let report = TransferReport::default();
        assert!(report.is_success());
        assert_eq!(report.error_message(), "");
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_counts() {
        let report = TransferReport::new(vec![ok("a"), bad("b", "denied"), ok("c")]);
        assert_eq!(report.total(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
    }

    #[test]
    fn test_error_message_concatenates_failures() {
        let report = TransferReport::new(vec![bad("a.m4s", "timeout"), ok("b"), bad("c.mpd", "denied")]);
        assert_eq!(report.error_message(), "a.m4s: timeout; c.mpd: denied");
    }

    #[test]
    fn test_into_result_failure() {
        let report = TransferReport::new(vec![ok("a"), bad("b", "quota exceeded")]);
        match report.into_result() {
            Err(TransferError::Incomplete {
                failed,
                total,
                message,
            }) => {
                assert_eq!(failed, 1);
                assert_eq!(total, 2);
                assert_eq!(message, "b: quota exceeded");
            }
            other => panic!("expected Incomplete, got {:?}", other),
        }
    }
}
