//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the engine and infrastructure.
//! Implementations live in other crates (lexgraph-provider, lexgraph-store);
//! the engine only ever sees these seams, injected at construction.

use crate::extraction::{ProviderError, RawExtraction, WindowRequest};
use crate::job::{JobKey, JobStatus, ProcessingJob};

/// Trait for the external text-extraction backend
///
/// Given one window of text plus configuration, a provider returns raw
/// labeled spans with window-local offsets. Whether the backend is an LLM
/// call or a different NLP engine is invisible to the extractor.
///
/// Calls are synchronous; the extractor runs them on a blocking pool with
/// its own timeout and retry policy.
pub trait ExtractionProvider {
    /// Run extraction over one window
    fn invoke(&self, request: &WindowRequest) -> Result<Vec<RawExtraction>, ProviderError>;
}

/// Trait for persisting processing jobs by composite key
///
/// Semantics required by the state machine:
/// - `upsert` is atomic and last-write-wins, so at most one record exists
///   per key at any time.
/// - `update_if_status` is the compare-and-set primitive: it writes the job
///   only when the stored record still has `expected` status, and reports
///   whether the write happened. Concurrency safety comes from this, never
///   from in-process locks - multiple processes may share one store.
pub trait DocumentStore {
    /// Error type for store operations
    type Error;

    /// Insert or replace the record for the job's key
    fn upsert(&self, job: &ProcessingJob) -> Result<(), Self::Error>;

    /// Look up the record for a key
    fn find_one(&self, key: &JobKey) -> Result<Option<ProcessingJob>, Self::Error>;

    /// Replace the record only if its stored status is `expected`
    ///
    /// Returns true when the transition was applied, false when another
    /// writer got there first (or no record exists).
    fn update_if_status(
        &self,
        job: &ProcessingJob,
        expected: JobStatus,
    ) -> Result<bool, Self::Error>;
}
