//! The processing state machine: submit / run / status / cancel
//!
//! Lifecycle: PENDING -> PROCESSING -> {COMPLETED, FAILED}. The transient
//! states exist to make concurrent duplicate submissions idempotent; the
//! terminal states are overwritable only by a fresh forced submission.
//!
//! At-most-one concurrent run per key is enforced through the store's
//! compare-and-set transition, not an in-process lock - several processes
//! sharing one store get the same guarantee. A crash between claiming a job
//! and writing a terminal state leaves a stale PROCESSING record; operators
//! treat records older than the job timeout as eligible for resubmission.

use crate::config::EngineConfig;
use crate::error::EngineError;
use lexgraph_analysis::{RelationshipMapper, StructuredDocumentBuilder};
use lexgraph_domain::job::unix_timestamp;
use lexgraph_domain::traits::{DocumentStore, ExtractionProvider};
use lexgraph_domain::{
    DocumentType, JobKey, JobStatus, JobType, ProcessingJob, StructuredAnalysisResult,
};
use lexgraph_extractor::{ClauseExtractor, ExtractError};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Capability to drive one submitted job through its lifecycle
///
/// Handles are only obtainable from [`ProcessingEngine::submit`], so holding
/// one implies a PENDING record was durably written.
#[derive(Debug, Clone)]
pub struct JobHandle {
    key: JobKey,
}

impl JobHandle {
    /// The job key this handle refers to
    pub fn key(&self) -> &JobKey {
        &self.key
    }
}

/// Outcome of a submission
#[derive(Debug)]
pub enum Submission {
    /// A fresh PENDING record was written; the caller should schedule `run`
    Scheduled(JobHandle),

    /// A PENDING/PROCESSING record already exists; nothing new was started
    InFlight(ProcessingJob),

    /// A terminal record exists and `force` was not set; reported as-is
    Terminal(ProcessingJob),
}

/// The processing engine owns the lifecycle of extraction jobs
///
/// Collaborators (provider via the extractor, store) are injected at
/// construction. The engine is agnostic to how `run` gets scheduled - a
/// worker pool, a task queue, or a test calling it inline.
pub struct ProcessingEngine<P, S>
where
    P: ExtractionProvider + Send + Sync + 'static,
    S: DocumentStore,
{
    extractor: ClauseExtractor<P>,
    mapper: RelationshipMapper,
    store: Arc<S>,
    config: EngineConfig,
}

impl<P, S> ProcessingEngine<P, S>
where
    P: ExtractionProvider + Send + Sync + 'static,
    S: DocumentStore,
    S::Error: std::fmt::Display,
{
    /// Create a new engine
    pub fn new(extractor: ClauseExtractor<P>, store: S, config: EngineConfig) -> Self {
        Self {
            extractor,
            mapper: RelationshipMapper::default(),
            store: Arc::new(store),
            config,
        }
    }

    /// Replace the default relationship mapper
    pub fn with_mapper(mut self, mapper: RelationshipMapper) -> Self {
        self.mapper = mapper;
        self
    }

    /// Create or find the job record for a key
    ///
    /// Live records and (without `force`) terminal records are reported
    /// as-is - idempotent re-delivery must not silently rerun or discard a
    /// finished analysis. Only a fresh or forced submission writes a new
    /// PENDING record.
    pub fn submit(
        &self,
        document_id: &str,
        user_id: &str,
        job_type: JobType,
        force: bool,
    ) -> Result<Submission, EngineError> {
        let key = JobKey::new(document_id, user_id, job_type);

        match self.find(&key)? {
            Some(job) if !job.status.is_terminal() => {
                debug!("Submission for {} found live record ({})", key, job.status.as_str());
                Ok(Submission::InFlight(job))
            }
            Some(job) if !force => {
                debug!("Submission for {} found terminal record ({})", key, job.status.as_str());
                Ok(Submission::Terminal(job))
            }
            _ => {
                let job = ProcessingJob::pending(&key);
                self.store
                    .upsert(&job)
                    .map_err(|e| EngineError::Store(e.to_string()))?;
                info!("Job {} submitted", key);
                Ok(Submission::Scheduled(JobHandle { key }))
            }
        }
    }

    /// Drive one job to a terminal state
    ///
    /// Claims the PENDING record (a lost claim race is a no-op, so duplicate
    /// scheduling is harmless), runs extract -> map -> build under the job
    /// timeout, and records COMPLETED or FAILED. Terminal writes are
    /// conditional on the record still being PROCESSING, so a cancelled
    /// job's late result is discarded rather than resurrected.
    pub async fn run(
        &self,
        handle: &JobHandle,
        document_text: &str,
        document_type: DocumentType,
    ) -> Result<(), EngineError> {
        let key = handle.key();
        let Some(record) = self.find(key)? else {
            return Err(EngineError::JobNotFound(key.to_string()));
        };

        let mut claimed = record;
        claimed.status = JobStatus::Processing;
        claimed.updated_at = unix_timestamp();
        let won = self
            .store
            .update_if_status(&claimed, JobStatus::Pending)
            .map_err(|e| EngineError::Store(e.to_string()))?;
        if !won {
            debug!("Job {} not claimable (already running or terminal)", key);
            return Ok(());
        }

        info!("Job {} processing", key);

        let outcome = timeout(
            self.config.job_timeout(),
            self.process(key, document_text, document_type),
        )
        .await;

        match outcome {
            Ok(Ok(result)) => {
                let mut done = claimed;
                done.status = JobStatus::Completed;
                done.result = Some(result);
                done.error = None;
                done.updated_at = unix_timestamp();
                let applied = self
                    .store
                    .update_if_status(&done, JobStatus::Processing)
                    .map_err(|e| EngineError::Store(e.to_string()))?;
                if applied {
                    info!("Job {} completed", key);
                } else {
                    info!("Job {} result discarded: record no longer processing", key);
                }
                Ok(())
            }
            Ok(Err(e)) => self.record_failure(claimed, e.to_string()),
            Err(_) => self.record_failure(
                claimed,
                format!("processing timed out after {}s", self.config.job_timeout_secs),
            ),
        }
    }

    /// Read-only lookup of a job record
    pub fn status(&self, key: &JobKey) -> Result<ProcessingJob, EngineError> {
        self.find(key)?
            .ok_or_else(|| EngineError::JobNotFound(key.to_string()))
    }

    /// Logically abandon a job
    ///
    /// Marks a live record FAILED with reason "cancelled" and reports
    /// whether the transition applied. In-flight provider calls are left to
    /// finish; their results die against the compare-and-set in `run`.
    pub fn cancel(&self, key: &JobKey) -> Result<bool, EngineError> {
        let Some(job) = self.find(key)? else {
            return Err(EngineError::JobNotFound(key.to_string()));
        };
        if job.status.is_terminal() {
            return Ok(false);
        }

        let from = job.status;
        let mut cancelled = job;
        cancelled.status = JobStatus::Failed;
        cancelled.error = Some("cancelled".to_string());
        cancelled.result = None;
        cancelled.updated_at = unix_timestamp();

        let applied = self
            .store
            .update_if_status(&cancelled, from)
            .map_err(|e| EngineError::Store(e.to_string()))?;
        if applied {
            info!("Job {} cancelled", cancelled.key());
        }
        Ok(applied)
    }

    /// The extraction pipeline: extract -> map -> build
    async fn process(
        &self,
        key: &JobKey,
        document_text: &str,
        document_type: DocumentType,
    ) -> Result<StructuredAnalysisResult, ExtractError> {
        let started = Instant::now();

        let outcome = self
            .extractor
            .extract(&key.document_id, document_text, document_type)
            .await?;

        let relationships = self.mapper.map(&outcome.clauses);

        Ok(StructuredDocumentBuilder::build(
            &key.document_id,
            document_type,
            outcome.clauses,
            relationships,
            outcome.metadata,
            started.elapsed().as_secs_f64(),
        ))
    }

    fn record_failure(&self, claimed: ProcessingJob, error: String) -> Result<(), EngineError> {
        warn!("Job {} failed: {}", claimed.key(), error);

        let mut failed = claimed;
        failed.status = JobStatus::Failed;
        failed.result = None;
        failed.error = Some(error);
        failed.updated_at = unix_timestamp();

        self.store
            .update_if_status(&failed, JobStatus::Processing)
            .map_err(|e| EngineError::Store(e.to_string()))?;
        Ok(())
    }

    fn find(&self, key: &JobKey) -> Result<Option<ProcessingJob>, EngineError> {
        self.store
            .find_one(key)
            .map_err(|e| EngineError::Store(e.to_string()))
    }
}
