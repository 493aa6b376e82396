//! Structured analysis record - the final aggregated output for one document

use crate::clause::Clause;
use crate::document_type::DocumentType;
use crate::extraction::ExtractionMetadata;
use crate::relationship::ClauseRelationship;
use serde::{Deserialize, Serialize};

/// Overall risk grade for a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// No risk factors extracted
    Low,

    /// A few low-confidence risk factors
    Medium,

    /// A confident risk factor, or several of any confidence
    High,
}

impl RiskLevel {
    /// Get the risk level as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// Risk summary derived from RISK_FACTOR clauses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Rule-based overall grade
    pub overall_risk_level: RiskLevel,

    /// Texts of the risk factor clauses that drove the grade
    pub risk_factors: Vec<String>,
}

/// Coverage of the document type's mandatory clause checklist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceCheck {
    /// Mean confidence over checklist-relevant clauses, scaled 0-100
    pub compliance_score: f64,

    /// One entry per mandatory clause type absent from the document
    pub issues: Vec<String>,
}

/// The aggregated analysis record for one document
///
/// Owned exclusively by one processing job; written once, read many times.
/// Field names are stable across versions - schema evolution is additive only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredAnalysisResult {
    /// Document this analysis belongs to
    pub document_id: String,

    /// Document type the extraction ran under
    pub document_type: DocumentType,

    /// All clauses in document order
    pub extracted_clauses: Vec<Clause>,

    /// All inferred relationships
    pub clause_relationships: Vec<ClauseRelationship>,

    /// Texts of PARTY_IDENTIFICATION clauses
    pub parties_identified: Vec<String>,

    /// Texts of FINANCIAL_TERMS clauses
    pub financial_terms: Vec<String>,

    /// Texts of DATE_TERM clauses
    pub important_dates: Vec<String>,

    /// Risk summary
    pub risk_assessment: RiskAssessment,

    /// Mandatory-clause coverage
    pub compliance_check: ComplianceCheck,

    /// Mean of all clause confidences (0 when no clauses)
    pub confidence_score: f64,

    /// Wall-clock processing time for the whole job
    pub processing_time_seconds: f64,

    /// Metadata from the extraction run
    pub extraction_metadata: ExtractionMetadata,
}
