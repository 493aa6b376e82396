//! Error types for the processing engine

use thiserror::Error;

/// Errors the state machine surfaces to callers
///
/// Pipeline failures are NOT here: extraction and aggregation errors end up
/// as a FAILED job record with a readable message, never as a thrown error.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Status query for a key that was never submitted
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// The document store itself failed
    #[error("Store error: {0}")]
    Store(String),
}
