//! Extraction result types

use lexgraph_domain::{Clause, ClauseType, ExtractionMetadata};
use std::collections::BTreeSet;

/// Result of extracting one document
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    /// Clauses in document order with assigned ids
    pub clauses: Vec<Clause>,

    /// Run metadata: window counts, warnings, duration
    pub metadata: ExtractionMetadata,
}

/// A clause under construction, before id assignment
///
/// Candidates carry absolute offsets and are merged by the dedup pass;
/// only survivors become `Clause`s.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CandidateClause {
    pub clause_type: ClauseType,
    pub text: String,
    pub char_start: usize,
    pub char_end: usize,
    pub key_terms: BTreeSet<String>,
    pub confidence: f64,
}

impl CandidateClause {
    /// Span length in chars
    pub fn span_len(&self) -> usize {
        self.char_end.saturating_sub(self.char_start)
    }

    /// Convert into a clause with the given id
    pub fn into_clause(self, clause_id: String) -> Clause {
        Clause {
            clause_id,
            clause_type: self.clause_type,
            clause_text: self.text,
            key_terms: self.key_terms,
            confidence_score: self.confidence,
            char_offset_start: self.char_start,
            char_offset_end: self.char_end,
        }
    }
}
