//! Durable job records and the `JobRepository` seam the pipeline persists
//! through.

use rusqlite::{params, OptionalExtension, Row};

use super::media_repo::{self, MediaRow};
use super::{format_timestamp, parse_timestamp, Database, DatabaseError};
use crate::domain::{Job, JobStatus};

/// Durable storage of job records, keyed by job id.
///
/// Implementations must persist the job's status, error, `updated_at` and
/// the media's staged `local_path` on `update`.
pub trait JobRepository: Send + Sync {
    fn insert(&self, job: &Job) -> Result<Job, DatabaseError>;

    /// Fails with `DatabaseError::NotFound` when no job has this id.
    fn find(&self, id: &str) -> Result<Job, DatabaseError>;

    fn update(&self, job: &Job) -> Result<Job, DatabaseError>;
}

const SELECT_JOB: &str = "SELECT j.id AS job_id, j.status, j.error, j.output_bucket_path,
        j.created_at AS job_created_at, j.updated_at,
        m.id, m.resource_locator, m.local_path, m.created_at
     FROM jobs j JOIN media m ON m.id = j.media_id";

/// A raw job row joined with its media row.
#[derive(Debug, Clone)]
pub struct JobRow {
    pub id: String,
    pub status: String,
    pub error: Option<String>,
    pub output_bucket_path: String,
    pub created_at: String,
    pub updated_at: String,
    pub media: MediaRow,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("job_id")?,
            status: row.get("status")?,
            error: row.get("error")?,
            output_bucket_path: row.get("output_bucket_path")?,
            created_at: row.get("job_created_at")?,
            updated_at: row.get("updated_at")?,
            media: MediaRow::from_row(row)?,
        })
    }

    fn into_job(self) -> Result<Job, DatabaseError> {
        let status = self
            .status
            .parse::<JobStatus>()
            .map_err(|e| DatabaseError::InvalidRecord {
                entity: "job",
                id: self.id.clone(),
                reason: e.to_string(),
            })?;
        let created_at = parse_timestamp("job", &self.id, &self.created_at)?;
        let updated_at = parse_timestamp("job", &self.id, &self.updated_at)?;

        Ok(Job {
            id: self.id,
            status,
            media: self.media.into_media()?,
            output_bucket_path: self.output_bucket_path,
            error: self.error,
            created_at,
            updated_at,
        })
    }
}

/// SQLite-backed `JobRepository`.
#[derive(Clone)]
pub struct SqliteJobRepository {
    db: Database,
}

impl SqliteJobRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Lists jobs with the given status, newest first.
    pub fn list_by_status(&self, status: JobStatus) -> Result<Vec<Job>, DatabaseError> {
        let rows = self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE j.status = ?1 ORDER BY j.created_at DESC",
                SELECT_JOB
            ))?;
            let rows = stmt
                .query_map(params![status.as_str()], JobRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        rows.into_iter().map(JobRow::into_job).collect()
    }
}

impl JobRepository for SqliteJobRepository {
    fn insert(&self, job: &Job) -> Result<Job, DatabaseError> {
        let media_row = MediaRow::from_media(&job.media);
        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            media_repo::insert_row(&tx, &media_row)?;
            tx.execute(
                "INSERT INTO jobs (id, media_id, output_bucket_path, status, error, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    job.id,
                    job.media.id,
                    job.output_bucket_path,
                    job.status.as_str(),
                    job.error,
                    format_timestamp(&job.created_at),
                    format_timestamp(&job.updated_at),
                ],
            )?;
            tx.commit()?;
            Ok(())
        })?;

        Ok(job.clone())
    }

    fn find(&self, id: &str) -> Result<Job, DatabaseError> {
        let row = self.db.with_conn(|conn| {
            conn.query_row(
                &format!("{} WHERE j.id = ?1", SELECT_JOB),
                params![id],
                JobRow::from_row,
            )
            .optional()
            .map_err(DatabaseError::from)
        })?;

        match row {
            Some(row) => row.into_job(),
            None => Err(DatabaseError::NotFound {
                entity: "job",
                id: id.to_string(),
            }),
        }
    }

    fn update(&self, job: &Job) -> Result<Job, DatabaseError> {
        let local_path = job
            .media
            .local_path
            .as_ref()
            .map(|p| p.to_string_lossy().to_string());

        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;

            let stored: Option<String> = tx
                .query_row(
                    "SELECT status FROM jobs WHERE id = ?1",
                    params![job.id],
                    |r| r.get(0),
                )
                .optional()?;
            let stored = stored.ok_or_else(|| DatabaseError::NotFound {
                entity: "job",
                id: job.id.clone(),
            })?;

            if matches!(stored.parse::<JobStatus>(), Ok(s) if s.is_terminal()) {
                return Err(DatabaseError::Conflict {
                    entity: "job",
                    id: job.id.clone(),
                    reason: format!("record is {} and can no longer change", stored),
                });
            }

            tx.execute(
                "UPDATE jobs SET status = ?2, error = ?3, updated_at = ?4 WHERE id = ?1",
                params![
                    job.id,
                    job.status.as_str(),
                    job.error,
                    format_timestamp(&job.updated_at),
                ],
            )?;
            media_repo::update_local_path(&tx, &job.media.id, local_path.as_deref())?;

            tx.commit()?;
            Ok(())
        })?;

        Ok(job.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Media;
    use std::path::PathBuf;

    fn test_repo() -> SqliteJobRepository {
        SqliteJobRepository::new(Database::open_in_memory().expect("Failed to create test database"))
    }

    fn sample_job() -> Job {
        Job::new(Media::new("uploads/demo.mp4"), "encoded-videos")
    }

    #[test]
    fn test_insert_and_find() {
        let repo = test_repo();
        let job = sample_job();
        repo.insert(&job).unwrap();

        let found = repo.find(&job.id).unwrap();
        assert_eq!(found.id, job.id);
        assert_eq!(found.status, JobStatus::Pending);
        assert_eq!(found.output_bucket_path, "encoded-videos");
        assert_eq!(found.media.id, job.media.id);
        assert_eq!(found.media.resource_locator, "uploads/demo.mp4");
        assert!(found.error.is_none());
    }

    #[test]
    fn test_find_nonexistent() {
        let repo = test_repo();
        let err = repo.find("missing").unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { entity: "job", .. }));
    }

    #[test]
    fn test_duplicate_insert_fails() {
        let repo = test_repo();
        let job = sample_job();
        repo.insert(&job).unwrap();
        assert!(matches!(
            repo.insert(&job).unwrap_err(),
            DatabaseError::Sqlite(_)
        ));
    }

    #[test]
    fn test_update_persists_status_and_local_path() {
        let repo = test_repo();
        let job = sample_job();
        repo.insert(&job).unwrap();

        let mut next = job.advanced(JobStatus::Acquiring).unwrap();
        next.media.local_path = Some(PathBuf::from("/stage/demo.mp4"));
        repo.update(&next).unwrap();

        let found = repo.find(&job.id).unwrap();
        assert_eq!(found.status, JobStatus::Acquiring);
        assert_eq!(found.media.local_path, Some(PathBuf::from("/stage/demo.mp4")));
        assert!(found.updated_at >= job.updated_at);
    }

    #[test]
    fn test_update_records_failure() {
        let repo = test_repo();
        let job = sample_job();
        repo.insert(&job).unwrap();

        let failed = job.failed("source object missing").unwrap();
        repo.update(&failed).unwrap();

        let found = repo.find(&job.id).unwrap();
        assert_eq!(found.status, JobStatus::Failed);
        assert_eq!(found.error.as_deref(), Some("source object missing"));
    }

    #[test]
    fn test_terminal_record_is_immutable() {
        let repo = test_repo();
        let job = sample_job();
        repo.insert(&job).unwrap();
        let failed = job.failed("boom").unwrap();
        repo.update(&failed).unwrap();

        let mut sneaky = failed.clone();
        sneaky.error = Some("rewritten".to_string());
        let err = repo.update(&sneaky).unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict { .. }));
        assert_eq!(repo.find(&job.id).unwrap().error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_update_unknown_job() {
        let repo = test_repo();
        let err = repo.update(&sample_job()).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn test_list_by_status() {
        let repo = test_repo();
        let a = sample_job();
        let b = sample_job();
        repo.insert(&a).unwrap();
        repo.insert(&b).unwrap();
        repo.update(&b.advanced(JobStatus::Acquiring).unwrap()).unwrap();

        let pending = repo.list_by_status(JobStatus::Pending).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, a.id);
        assert_eq!(repo.list_by_status(JobStatus::Acquiring).unwrap().len(), 1);
        assert!(repo.list_by_status(JobStatus::Completed).unwrap().is_empty());
    }
}
