//! Error types for the extractor

use thiserror::Error;

/// Errors that can occur during clause extraction
#[derive(Error, Debug)]
pub enum ExtractError {
    /// No configuration registered for the document type and no fallback
    ///
    /// Unreachable when the registry was built with `with_defaults()` -
    /// callers must not rely on this error for control flow.
    #[error("Unknown document type: {0}")]
    UnknownDocumentType(String),

    /// Every window call failed after retries
    #[error("Extraction failed: all {0} windows failed")]
    ExtractionFailed(usize),

    /// Input text exceeds the configured maximum
    #[error("Text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
