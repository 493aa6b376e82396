//! Lexgraph Extraction Layer
//!
//! Turns unstructured legal text into typed, confidence-scored clauses:
//!
//! 1. The [`registry::ExtractionConfigRegistry`] resolves per-document-type
//!    configuration (prompt, worked examples, chunking, parallelism).
//! 2. The [`chunking::TextChunker`] splits the document into overlapping
//!    char-addressed windows.
//! 3. The [`extractor::ClauseExtractor`] fans windows out to the injected
//!    `ExtractionProvider` (bounded concurrency, per-call timeout, retry
//!    with backoff), lifts spans to absolute offsets, deduplicates
//!    overlapping sightings, and assigns ordinal clause ids.
//!
//! Partial failure is tolerated: windows that keep failing are dropped with
//! a metadata warning; only a document where every window failed surfaces as
//! an error.

#![warn(missing_docs)]

pub mod chunking;
pub mod config;
mod dedup;
pub mod error;
pub mod extractor;
pub mod keyterms;
pub mod registry;
mod types;

pub use config::{ExtractionConfig, ExtractorSettings};
pub use error::ExtractError;
pub use extractor::{ClauseExtractor, DEFAULT_CONFIDENCE};
pub use registry::ExtractionConfigRegistry;
pub use types::ExtractionOutcome;
