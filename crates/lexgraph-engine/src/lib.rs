//! Lexgraph Processing Engine
//!
//! Owns the asynchronous lifecycle of extraction jobs and wires the
//! pipeline together:
//!
//! ```text
//! text -> ClauseExtractor -> RelationshipMapper -> StructuredDocumentBuilder
//!                                   |
//!                 ProcessingEngine persists the record and
//!                 transitions PENDING -> PROCESSING -> COMPLETED/FAILED
//! ```
//!
//! The engine never launches background tasks itself: `submit` durably
//! writes the PENDING record and returns, and the boundary layer schedules
//! `run` however it likes (worker pool, task queue, inline in tests).
//! Every terminal outcome - success, pipeline error, timeout, cancellation -
//! is readable from the persisted `ProcessingJob`; callers never have to
//! translate thrown errors.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod machine;

pub use config::EngineConfig;
pub use error::EngineError;
pub use machine::{JobHandle, ProcessingEngine, Submission};
