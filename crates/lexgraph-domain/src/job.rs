//! Processing job module - the persisted lifecycle record for one extraction

use crate::analysis::StructuredAnalysisResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current timestamp in seconds since the Unix epoch
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Kind of processing a job performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    /// Full analysis: clauses, relationships, structured record
    Analysis,

    /// Clause extraction only
    Extraction,
}

impl JobType {
    /// Get the job type as a string (stable wire tag)
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Analysis => "ANALYSIS",
            JobType::Extraction => "EXTRACTION",
        }
    }

    /// Parse a job type from its wire tag
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ANALYSIS" => Some(JobType::Analysis),
            "EXTRACTION" => Some(JobType::Extraction),
            _ => None,
        }
    }
}

/// Lifecycle state of a processing job
///
/// PENDING and PROCESSING are transient; COMPLETED and FAILED are terminal
/// and only a fresh forced submission replaces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Submitted, not yet picked up
    Pending,

    /// Pipeline is running
    Processing,

    /// Finished with a result
    Completed,

    /// Finished with an error message
    Failed,
}

impl JobStatus {
    /// Get the status as a string (stable wire tag)
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }

    /// Parse a status from its wire tag
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(JobStatus::Pending),
            "PROCESSING" => Some(JobStatus::Processing),
            "COMPLETED" => Some(JobStatus::Completed),
            "FAILED" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// Whether this status admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Composite identity of a processing job
///
/// The store enforces at most one live record per key via upsert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobKey {
    /// Document being processed
    pub document_id: String,

    /// User who submitted the job
    pub user_id: String,

    /// Kind of processing requested
    pub job_type: JobType,
}

impl JobKey {
    /// Create a new job key
    pub fn new(
        document_id: impl Into<String>,
        user_id: impl Into<String>,
        job_type: JobType,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            user_id: user_id.into(),
            job_type,
        }
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.document_id,
            self.user_id,
            self.job_type.as_str()
        )
    }
}

/// The persisted unit of work tracking one document's analysis lifecycle
///
/// Created on submission, mutated only by the state machine, never deleted
/// by this core (retention is an external policy).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingJob {
    /// Document being processed
    pub document_id: String,

    /// User who submitted the job
    pub user_id: String,

    /// Kind of processing requested
    pub job_type: JobType,

    /// Current lifecycle state
    pub status: JobStatus,

    /// Analysis record, present once the job completes
    pub result: Option<StructuredAnalysisResult>,

    /// Human-readable failure reason, present once the job fails
    pub error: Option<String>,

    /// Unix seconds when the job record was created
    pub created_at: u64,

    /// Unix seconds when the job record last changed
    pub updated_at: u64,
}

impl ProcessingJob {
    /// Create a fresh PENDING record for a key
    pub fn pending(key: &JobKey) -> Self {
        let now = unix_timestamp();
        Self {
            document_id: key.document_id.clone(),
            user_id: key.user_id.clone(),
            job_type: key.job_type,
            status: JobStatus::Pending,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The identity key of this record
    pub fn key(&self) -> JobKey {
        JobKey {
            document_id: self.document_id.clone(),
            user_id: self.user_id.clone(),
            job_type: self.job_type,
        }
    }
}
