//! Aggregation of clauses and relationships into the analysis record

use lexgraph_domain::{
    Clause, ClauseRelationship, ClauseType, ComplianceCheck, DocumentType, ExtractionMetadata,
    RiskAssessment, RiskLevel, StructuredAnalysisResult,
};

/// Confidence above which a single risk factor forces a high risk grade
const HIGH_CONFIDENCE_RISK: f64 = 0.8;

/// Risk factor count at which the grade is high regardless of confidence
const HIGH_RISK_COUNT: usize = 3;

/// Aggregates extraction output into a `StructuredAnalysisResult`
///
/// Pure and deterministic: identical inputs always produce an identical
/// record, which the reproducibility tests rely on.
pub struct StructuredDocumentBuilder;

impl StructuredDocumentBuilder {
    /// Build the analysis record for one document
    pub fn build(
        document_id: &str,
        document_type: DocumentType,
        clauses: Vec<Clause>,
        relationships: Vec<ClauseRelationship>,
        extraction_metadata: ExtractionMetadata,
        processing_time_seconds: f64,
    ) -> StructuredAnalysisResult {
        let texts_of = |clause_type: ClauseType| -> Vec<String> {
            clauses
                .iter()
                .filter(|c| c.clause_type == clause_type)
                .map(|c| c.clause_text.clone())
                .collect()
        };

        let parties_identified = texts_of(ClauseType::PartyIdentification);
        let financial_terms = texts_of(ClauseType::FinancialTerms);
        let important_dates = texts_of(ClauseType::DateTerm);

        let risk_assessment = assess_risk(&clauses);
        let compliance_check = check_compliance(document_type, &clauses);

        let confidence_score = mean(clauses.iter().map(|c| c.confidence_score));

        StructuredAnalysisResult {
            document_id: document_id.to_string(),
            document_type,
            extracted_clauses: clauses,
            clause_relationships: relationships,
            parties_identified,
            financial_terms,
            important_dates,
            risk_assessment,
            compliance_check,
            confidence_score,
            processing_time_seconds,
            extraction_metadata,
        }
    }
}

/// Rule-based risk grade from RISK_FACTOR clauses
fn assess_risk(clauses: &[Clause]) -> RiskAssessment {
    let risk_clauses: Vec<&Clause> = clauses
        .iter()
        .filter(|c| c.clause_type == ClauseType::RiskFactor)
        .collect();

    let confident_risk = risk_clauses
        .iter()
        .any(|c| c.confidence_score > HIGH_CONFIDENCE_RISK);

    let overall_risk_level = if risk_clauses.is_empty() {
        RiskLevel::Low
    } else if confident_risk || risk_clauses.len() >= HIGH_RISK_COUNT {
        RiskLevel::High
    } else {
        RiskLevel::Medium
    };

    RiskAssessment {
        overall_risk_level,
        risk_factors: risk_clauses.iter().map(|c| c.clause_text.clone()).collect(),
    }
}

/// Coverage of the document type's mandatory clause checklist
///
/// Score is the mean confidence across checklist-relevant clauses, scaled
/// 0-100 (0 when none are present); each absent mandatory type becomes one
/// issue.
fn check_compliance(document_type: DocumentType, clauses: &[Clause]) -> ComplianceCheck {
    let mandatory = document_type.mandatory_clauses();

    let relevant: Vec<&Clause> = clauses
        .iter()
        .filter(|c| mandatory.contains(&c.clause_type))
        .collect();

    let compliance_score = mean(relevant.iter().map(|c| c.confidence_score)) * 100.0;

    let issues = mandatory
        .iter()
        .filter(|required| !clauses.iter().any(|c| c.clause_type == **required))
        .map(|required| format!("missing mandatory clause: {}", required.as_str()))
        .collect();

    ComplianceCheck {
        compliance_score,
        issues,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn clause(ordinal: usize, clause_type: ClauseType, text: &str, confidence: f64) -> Clause {
        Clause {
            clause_id: Clause::format_id("doc", ordinal),
            clause_type,
            clause_text: text.to_string(),
            key_terms: BTreeSet::new(),
            confidence_score: confidence,
            char_offset_start: ordinal * 50,
            char_offset_end: ordinal * 50 + text.chars().count(),
        }
    }

    fn build(document_type: DocumentType, clauses: Vec<Clause>) -> StructuredAnalysisResult {
        StructuredDocumentBuilder::build(
            "doc",
            document_type,
            clauses,
            Vec::new(),
            ExtractionMetadata::new("mock"),
            1.5,
        )
    }

    #[test]
    fn test_no_risk_clauses_is_low_risk() {
        let result = build(
            DocumentType::Rental,
            vec![
                clause(0, ClauseType::PartyIdentification, "A and B", 0.9),
                clause(1, ClauseType::FinancialTerms, "$900 rent", 0.9),
            ],
        );

        assert_eq!(result.risk_assessment.overall_risk_level, RiskLevel::Low);
        assert!(result.risk_assessment.risk_factors.is_empty());
    }

    #[test]
    fn test_compliance_from_coverage_only() {
        // Two of rental's four mandatory types present, both confidence 0.9
        let result = build(
            DocumentType::Rental,
            vec![
                clause(0, ClauseType::PartyIdentification, "A and B", 0.9),
                clause(1, ClauseType::FinancialTerms, "$900 rent", 0.9),
            ],
        );

        assert!((result.compliance_check.compliance_score - 90.0).abs() < 1e-9);
        assert_eq!(result.compliance_check.issues.len(), 2);
        assert!(result
            .compliance_check
            .issues
            .iter()
            .any(|i| i.contains("DATE_TERM")));
        assert!(result
            .compliance_check
            .issues
            .iter()
            .any(|i| i.contains("TERMINATION")));
    }

    #[test]
    fn test_single_confident_risk_is_high() {
        let result = build(
            DocumentType::Generic,
            vec![clause(0, ClauseType::RiskFactor, "unlimited liability", 0.95)],
        );
        assert_eq!(result.risk_assessment.overall_risk_level, RiskLevel::High);
    }

    #[test]
    fn test_three_weak_risks_are_high() {
        let result = build(
            DocumentType::Generic,
            vec![
                clause(0, ClauseType::RiskFactor, "a", 0.4),
                clause(1, ClauseType::RiskFactor, "b", 0.4),
                clause(2, ClauseType::RiskFactor, "c", 0.4),
            ],
        );
        assert_eq!(result.risk_assessment.overall_risk_level, RiskLevel::High);
    }

    #[test]
    fn test_two_weak_risks_are_medium() {
        let result = build(
            DocumentType::Generic,
            vec![
                clause(0, ClauseType::RiskFactor, "a", 0.4),
                clause(1, ClauseType::RiskFactor, "b", 0.7),
            ],
        );
        assert_eq!(result.risk_assessment.overall_risk_level, RiskLevel::Medium);
        assert_eq!(result.risk_assessment.risk_factors.len(), 2);
    }

    #[test]
    fn test_aggregate_confidence_is_mean() {
        let result = build(
            DocumentType::Generic,
            vec![
                clause(0, ClauseType::Obligation, "a", 0.4),
                clause(1, ClauseType::DateTerm, "b", 0.8),
            ],
        );
        assert!((result.confidence_score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_empty_document() {
        let result = build(DocumentType::Rental, Vec::new());

        assert_eq!(result.confidence_score, 0.0);
        assert_eq!(result.compliance_check.compliance_score, 0.0);
        // Every mandatory type is an issue
        assert_eq!(
            result.compliance_check.issues.len(),
            DocumentType::Rental.mandatory_clauses().len()
        );
        assert_eq!(result.risk_assessment.overall_risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_buckets_preserve_document_order() {
        let result = build(
            DocumentType::Generic,
            vec![
                clause(0, ClauseType::DateTerm, "first date", 0.9),
                clause(1, ClauseType::PartyIdentification, "the parties", 0.9),
                clause(2, ClauseType::DateTerm, "second date", 0.9),
            ],
        );

        assert_eq!(result.important_dates, vec!["first date", "second date"]);
        assert_eq!(result.parties_identified, vec!["the parties"]);
        assert!(result.financial_terms.is_empty());
    }

    #[test]
    fn test_build_is_deterministic() {
        let clauses = vec![
            clause(0, ClauseType::PartyIdentification, "A and B", 0.9),
            clause(1, ClauseType::RiskFactor, "penalty", 0.5),
        ];
        let metadata = ExtractionMetadata::new("mock");

        let a = StructuredDocumentBuilder::build(
            "doc",
            DocumentType::Nda,
            clauses.clone(),
            Vec::new(),
            metadata.clone(),
            2.0,
        );
        let b = StructuredDocumentBuilder::build(
            "doc",
            DocumentType::Nda,
            clauses,
            Vec::new(),
            metadata,
            2.0,
        );

        assert_eq!(a, b);
    }
}
