//! Lexgraph Analysis Layer
//!
//! Pure functions over the extracted clause list:
//!
//! - [`mapper::RelationshipMapper`] infers pairwise relationships
//!   (dependency, reference, conflict, temporal ordering) with a strength
//!   score.
//! - [`builder::StructuredDocumentBuilder`] aggregates clauses and
//!   relationships into the structured analysis record (parties, financial
//!   terms, dates, risk, compliance).
//!
//! Both are deterministic given identical inputs and are independently
//! callable without the state machine, which keeps them trivially testable.

#![warn(missing_docs)]

pub mod builder;
pub mod mapper;

pub use builder::StructuredDocumentBuilder;
pub use mapper::{map_relationships, MapperConfig, RelationshipMapper};
