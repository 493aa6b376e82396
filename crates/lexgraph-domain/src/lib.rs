//! Lexgraph Domain Layer
//!
//! This crate contains the core data model for the clause extraction engine.
//! It defines the fundamental concepts, value objects, and trait interfaces
//! that all other layers depend upon.
//!
//! ## Key Concepts
//!
//! - **Clause**: a typed, confidence-scored span of legal text
//! - **ClauseRelationship**: a pairwise inferred connection between clauses
//! - **RawExtraction**: ephemeral, window-local provider output
//! - **StructuredAnalysisResult**: the aggregated record for one document
//! - **ProcessingJob**: the persisted lifecycle record for one extraction job
//!
//! ## Architecture
//!
//! - Pure data model and trait seams only
//! - Provider and store implementations live in other crates
//! - Everything persisted derives serde with stable field names

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod clause;
pub mod document_type;
pub mod extraction;
pub mod job;
pub mod relationship;
pub mod traits;

// Re-exports for convenience
pub use analysis::{ComplianceCheck, RiskAssessment, RiskLevel, StructuredAnalysisResult};
pub use clause::{Clause, ClauseType};
pub use document_type::DocumentType;
pub use extraction::{
    ExampleExtraction, ExtractionMetadata, ProviderError, RawExtraction, WindowRequest,
    WorkedExample,
};
pub use job::{JobKey, JobStatus, JobType, ProcessingJob};
pub use relationship::{ClauseRelationship, RelationshipType};
