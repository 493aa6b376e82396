//! Clause module - the unit of extracted legal meaning

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Category of an extracted clause
///
/// Provider output classes map onto this enum; anything the mapper does not
/// recognize lands in `Other` rather than being discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClauseType {
    /// Names the parties bound by the document
    PartyIdentification,

    /// Payment amounts, schedules, penalties, deposits
    FinancialTerms,

    /// Effective dates, deadlines, renewal dates
    DateTerm,

    /// Conditions under which the agreement ends
    Termination,

    /// Duties imposed on a party
    Obligation,

    /// Language that creates exposure for a party
    RiskFactor,

    /// Recognized clause with no more specific category
    Other,
}

impl ClauseType {
    /// Get the clause type name as a string (stable wire tag)
    pub fn as_str(&self) -> &'static str {
        match self {
            ClauseType::PartyIdentification => "PARTY_IDENTIFICATION",
            ClauseType::FinancialTerms => "FINANCIAL_TERMS",
            ClauseType::DateTerm => "DATE_TERM",
            ClauseType::Termination => "TERMINATION",
            ClauseType::Obligation => "OBLIGATION",
            ClauseType::RiskFactor => "RISK_FACTOR",
            ClauseType::Other => "OTHER",
        }
    }

    /// Parse a clause type from a provider extraction class
    ///
    /// Accepts both the wire tag ("FINANCIAL_TERMS") and the relaxed
    /// lowercase form providers tend to emit ("financial_terms").
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PARTY_IDENTIFICATION" | "PARTY" | "PARTIES" => Some(ClauseType::PartyIdentification),
            "FINANCIAL_TERMS" | "FINANCIAL" | "PAYMENT" => Some(ClauseType::FinancialTerms),
            "DATE_TERM" | "DATE" | "DEADLINE" => Some(ClauseType::DateTerm),
            "TERMINATION" => Some(ClauseType::Termination),
            "OBLIGATION" | "DUTY" => Some(ClauseType::Obligation),
            "RISK_FACTOR" | "RISK" => Some(ClauseType::RiskFactor),
            "OTHER" => Some(ClauseType::Other),
            _ => None,
        }
    }

    /// Map an arbitrary provider class onto a clause type, defaulting to Other
    pub fn from_class(s: &str) -> Self {
        Self::parse(s).unwrap_or(ClauseType::Other)
    }
}

impl std::str::FromStr for ClauseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid clause type: {}", s))
    }
}

/// A clause - a typed, confidence-scored span of the source document
///
/// Clauses are immutable once emitted by the extractor. `clause_text` is the
/// contiguous substring of the original document text at the recorded char
/// offsets; the extractor enforces this before a clause is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    /// Stable identifier: `{document_id}-clause-{ordinal}`
    pub clause_id: String,

    /// Category of the clause
    pub clause_type: ClauseType,

    /// Exact text of the clause as it appears in the document
    pub clause_text: String,

    /// Lowercased significant terms, for relationship inference
    pub key_terms: BTreeSet<String>,

    /// Confidence in [0, 1]; max of constituents under duplicate merging
    pub confidence_score: f64,

    /// Inclusive char offset of the clause start in the original document
    pub char_offset_start: usize,

    /// Exclusive char offset of the clause end
    pub char_offset_end: usize,
}

impl Clause {
    /// Format a clause id from a document id and ordinal position
    pub fn format_id(document_id: &str, ordinal: usize) -> String {
        format!("{}-clause-{}", document_id, ordinal)
    }

    /// Span length in chars
    pub fn span_len(&self) -> usize {
        self.char_offset_end.saturating_sub(self.char_offset_start)
    }
}
