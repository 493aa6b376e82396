//! Lexgraph Storage Layer
//!
//! Implements the `DocumentStore` trait over SQLite.
//!
//! # Architecture
//!
//! - One row per job, keyed by the composite (document_id, user_id,
//!   job_type) primary key
//! - `upsert` maps to `INSERT ... ON CONFLICT DO UPDATE` (last write wins)
//! - `update_if_status` maps to a conditional `UPDATE ... WHERE status = ?`,
//!   which is the atomic compare-and-set the state machine builds on
//! - The result payload is stored as a JSON document in a single column;
//!   schema evolution of the payload is additive only
//!
//! # Examples
//!
//! ```no_run
//! use lexgraph_store::SqliteStore;
//!
//! let store = SqliteStore::new("lexgraph.db").unwrap();
//! // Store is now ready for job operations
//! ```

#![warn(missing_docs)]

use lexgraph_domain::traits::DocumentStore;
use lexgraph_domain::{JobKey, JobStatus, JobType, ProcessingJob, StructuredAnalysisResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Default collection (table) name for processing jobs
pub const DEFAULT_COLLECTION: &str = "processing_jobs";

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Result payload could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored data does not map back onto the domain model
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A previous writer panicked while holding the connection
    #[error("Connection lock poisoned")]
    LockPoisoned,
}

/// SQLite-based implementation of `DocumentStore`
///
/// # Thread Safety
///
/// The connection is guarded by a mutex so one store can be shared across
/// tasks behind an `Arc`. Key-level concurrency guarantees come from the SQL
/// statements themselves, not from this lock - other processes writing the
/// same database file observe the same upsert/compare-and-set semantics.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    collection: String,
}

impl SqliteStore {
    /// Open a store at the given path with the default collection name
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::with_collection(path, DEFAULT_COLLECTION)
    }

    /// Open a store with a custom collection (table) name
    pub fn with_collection<P: AsRef<Path>>(
        path: P,
        collection: &str,
    ) -> Result<Self, StoreError> {
        validate_collection_name(collection)?;
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
            collection: collection.to_string(),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql").replace(DEFAULT_COLLECTION, &self.collection);
        self.conn()?.execute_batch(&schema)?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Serialize the result payload for storage
    fn result_to_json(job: &ProcessingJob) -> Result<Option<String>, StoreError> {
        job.result
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(StoreError::from)
    }

    fn row_to_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
        Ok(RawRow {
            document_id: row.get(0)?,
            user_id: row.get(1)?,
            job_type: row.get(2)?,
            status: row.get(3)?,
            result: row.get(4)?,
            error: row.get(5)?,
            created_at: row.get::<_, i64>(6)? as u64,
            updated_at: row.get::<_, i64>(7)? as u64,
        })
    }
}

/// Row image before domain-level parsing
struct RawRow {
    document_id: String,
    user_id: String,
    job_type: String,
    status: String,
    result: Option<String>,
    error: Option<String>,
    created_at: u64,
    updated_at: u64,
}

impl RawRow {
    fn into_job(self) -> Result<ProcessingJob, StoreError> {
        let job_type = JobType::parse(&self.job_type)
            .ok_or_else(|| StoreError::InvalidData(format!("Unknown job type: {}", self.job_type)))?;
        let status = JobStatus::parse(&self.status)
            .ok_or_else(|| StoreError::InvalidData(format!("Unknown status: {}", self.status)))?;
        let result: Option<StructuredAnalysisResult> = self
            .result
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(ProcessingJob {
            document_id: self.document_id,
            user_id: self.user_id,
            job_type,
            status,
            result,
            error: self.error,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Collection names are interpolated into SQL, so they must be plain
/// identifiers
fn validate_collection_name(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidData(format!(
            "Invalid collection name: {:?}",
            name
        )))
    }
}

impl DocumentStore for SqliteStore {
    type Error = StoreError;

    fn upsert(&self, job: &ProcessingJob) -> Result<(), Self::Error> {
        let result_json = Self::result_to_json(job)?;

        self.conn()?.execute(
            &format!(
                "INSERT INTO {} (document_id, user_id, job_type, status, result, error, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(document_id, user_id, job_type) DO UPDATE SET
                 status = excluded.status, result = excluded.result, error = excluded.error,
                 created_at = excluded.created_at, updated_at = excluded.updated_at",
                self.collection
            ),
            params![
                &job.document_id,
                &job.user_id,
                job.job_type.as_str(),
                job.status.as_str(),
                &result_json,
                &job.error,
                job.created_at as i64,
                job.updated_at as i64,
            ],
        )?;

        Ok(())
    }

    fn find_one(&self, key: &JobKey) -> Result<Option<ProcessingJob>, Self::Error> {
        let row = self
            .conn()?
            .query_row(
                &format!(
                    "SELECT document_id, user_id, job_type, status, result, error, created_at, updated_at
                     FROM {} WHERE document_id = ?1 AND user_id = ?2 AND job_type = ?3",
                    self.collection
                ),
                params![&key.document_id, &key.user_id, key.job_type.as_str()],
                Self::row_to_job,
            )
            .optional()?;

        row.map(RawRow::into_job).transpose()
    }

    fn update_if_status(
        &self,
        job: &ProcessingJob,
        expected: JobStatus,
    ) -> Result<bool, Self::Error> {
        let result_json = Self::result_to_json(job)?;

        let affected = self.conn()?.execute(
            &format!(
                "UPDATE {} SET status = ?1, result = ?2, error = ?3, updated_at = ?4
                 WHERE document_id = ?5 AND user_id = ?6 AND job_type = ?7 AND status = ?8",
                self.collection
            ),
            params![
                job.status.as_str(),
                &result_json,
                &job.error,
                job.updated_at as i64,
                &job.document_id,
                &job.user_id,
                job.job_type.as_str(),
                expected.as_str(),
            ],
        )?;

        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_name_validation() {
        assert!(validate_collection_name("processing_jobs").is_ok());
        assert!(validate_collection_name("_jobs2").is_ok());
        assert!(validate_collection_name("").is_err());
        assert!(validate_collection_name("2jobs").is_err());
        assert!(validate_collection_name("jobs; DROP TABLE x").is_err());
    }

    #[test]
    fn test_store_initialization() {
        assert!(SqliteStore::new(":memory:").is_ok());
    }

    #[test]
    fn test_custom_collection() {
        let store = SqliteStore::with_collection(":memory:", "legal_jobs").unwrap();
        let key = JobKey::new("doc", "user", JobType::Analysis);
        assert!(store.find_one(&key).unwrap().is_none());
    }
}
